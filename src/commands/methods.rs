//! `methods`: the calculation methods the provider accepts.

/// `(id, name)` pairs. Id 6 is unassigned upstream.
pub const CALCULATION_METHODS: [(u8, &str); 23] = [
    (0, "Shia Ithna-Ashari (Jafari)"),
    (1, "University of Islamic Sciences, Karachi"),
    (2, "Islamic Society of North America (ISNA)"),
    (3, "Muslim World League (MWL)"),
    (4, "Umm Al-Qura University, Makkah"),
    (5, "Egyptian General Authority of Survey"),
    (7, "Institute of Geophysics, University of Tehran"),
    (8, "Gulf Region"),
    (9, "Kuwait"),
    (10, "Qatar"),
    (11, "Majlis Ugama Islam Singapura (Singapore)"),
    (12, "Union Organization Islamic de France"),
    (13, "Diyanet Isleri Baskanligi, Turkey (experimental)"),
    (14, "Spiritual Administration of Muslims of Russia"),
    (15, "Moonsighting Committee Worldwide"),
    (16, "Dubai (experimental)"),
    (17, "JAKIM (Malaysia)"),
    (18, "Tunisia"),
    (19, "Algeria"),
    (20, "KEMENAG (Indonesia)"),
    (21, "Morocco"),
    (22, "Comunidade Islamica de Lisboa (Portugal)"),
    (23, "Ministry of Awqaf, Jordan"),
];

pub fn method_name(id: u8) -> Option<&'static str> {
    CALCULATION_METHODS
        .iter()
        .find(|(m, _)| *m == id)
        .map(|(_, name)| *name)
}

pub fn run() -> String {
    let mut out = String::from("Supported calculation methods:\n\n");
    for (id, name) in CALCULATION_METHODS {
        out.push_str(&format!("  {:<4} {}\n", id, name));
    }
    out.push_str("\nUse --method <ID> to select a calculation method.\n");
    out.push_str("If omitted, the API picks a default based on your location.\n");
    out
}
