use std::collections::HashMap;
use lazy_static::lazy_static;

lazy_static! {
    static ref STATE_NAMES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("AL", "Alabama");
        m.insert("AK", "Alaska");
        m.insert("AZ", "Arizona");
        m.insert("AR", "Arkansas");
        m.insert("CA", "California");
        m.insert("CO", "Colorado");
        m.insert("CT", "Connecticut");
        m.insert("DE", "Delaware");
        m.insert("FL", "Florida");
        m.insert("GA", "Georgia");
        m.insert("HI", "Hawaii");
        m.insert("ID", "Idaho");
        m.insert("IL", "Illinois");
        m.insert("IN", "Indiana");
        m.insert("IA", "Iowa");
        m.insert("KS", "Kansas");
        m.insert("KY", "Kentucky");
        m.insert("LA", "Louisiana");
        m.insert("ME", "Maine");
        m.insert("MD", "Maryland");
        m.insert("MA", "Massachusetts");
        m.insert("MI", "Michigan");
        m.insert("MN", "Minnesota");
        m.insert("MS", "Mississippi");
        m.insert("MO", "Missouri");
        m.insert("MT", "Montana");
        m.insert("NE", "Nebraska");
        m.insert("NV", "Nevada");
        m.insert("NH", "New Hampshire");
        m.insert("NJ", "New Jersey");
        m.insert("NM", "New Mexico");
        m.insert("NY", "New York");
        m.insert("NC", "North Carolina");
        m.insert("ND", "North Dakota");
        m.insert("OH", "Ohio");
        m.insert("OK", "Oklahoma");
        m.insert("OR", "Oregon");
        m.insert("PA", "Pennsylvania");
        m.insert("RI", "Rhode Island");
        m.insert("SC", "South Carolina");
        m.insert("SD", "South Dakota");
        m.insert("TN", "Tennessee");
        m.insert("TX", "Texas");
        m.insert("UT", "Utah");
        m.insert("VT", "Vermont");
        m.insert("VA", "Virginia");
        m.insert("WA", "Washington");
        m.insert("WV", "West Virginia");
        m.insert("WI", "Wisconsin");
        m.insert("WY", "Wyoming");
        m.insert("DC", "District of Columbia");
        m
    };
}

/// Full state name for a postal abbreviation. Unknown codes (territories,
/// blanks) come back unchanged.
pub fn full_state_name(abbreviation: &str) -> String {
    let code = abbreviation.trim();
    STATE_NAMES
        .get(code.to_uppercase().as_str())
        .map(|name| name.to_string())
        .unwrap_or_else(|| code.to_string())
}
