pub fn is_name(name: &str) -> bool {
    // NameStartChar (NameChar)*
    let mut c = name.chars();
    if !c.next().is_some_and(is_name_start_char) {
        return false;
    }
    c.all(is_name_char)
}

pub fn is_nc_name(name: &str) -> bool {
    // Name - (Char* ':' Char*)
    is_name(name) && !name.contains(':')
}

pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':'
        | 'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,  '-' | '.' | '0'..='9' | '\u{B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

/// Splits a URI into a namespace and a local name usable as an XML element name.
///
/// The local name is empty if the URI doesn't end with a name.
pub fn split_iri(iri: &str) -> (&str, &str) {
    let Some(position_base) = iri.rfind(|c| !is_name_char(c) || c == ':') else {
        return (iri, "");
    };
    match iri[position_base..].find(|c| is_name_start_char(c) && c != ':') {
        Some(position_add) => iri.split_at(position_base + position_add),
        None => (iri, ""),
    }
}

pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

pub fn is_utf8(encoding: &[u8]) -> bool {
    matches!(
        encoding.to_ascii_lowercase().as_slice(),
        b"unicode-1-1-utf-8"
            | b"unicode11utf8"
            | b"unicode20utf8"
            | b"utf-8"
            | b"utf8"
            | b"x-unicode20utf8"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_iri() {
        assert_eq!(
            split_iri("http://xmlns.com/foaf/0.1/name"),
            ("http://xmlns.com/foaf/0.1/", "name")
        );
        assert_eq!(split_iri("http://example.com/"), ("http://example.com/", ""));
        assert_eq!(
            split_iri("http://example.com/vocab#term"),
            ("http://example.com/vocab#", "term")
        );
        assert_eq!(split_iri("urn:isbn:0451450523"), ("urn:isbn:0451450523", ""));
        assert_eq!(split_iri("http://example.com/p1"), ("http://example.com/", "p1"));
    }

    #[test]
    fn names() {
        assert!(is_nc_name("title"));
        assert!(is_nc_name("_1"));
        assert!(!is_nc_name("1st"));
        assert!(!is_nc_name("dc:title"));
        assert!(!is_nc_name(""));
    }
}
