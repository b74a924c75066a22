/// UTF-8 text that went through a Windows-1252 decode once too often.
/// Longest sequences first so the euro sign is not eaten by the `â` rules.
const MOJIBAKE: &[(&str, &str)] = &[
    ("â‚¬", "€"),
    ("Ã§", "ç"),
    ("Ã‡", "Ç"),
    ("Ã£", "ã"),
    ("Ãµ", "õ"),
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã­", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã¢", "â"),
    ("Ãª", "ê"),
    ("Ã´", "ô"),
    ("Ã ", "à"),
    ("Âº", "º"),
    ("Âª", "ª"),
    ("Â²", "²"),
    ("Â³", "³"),
];

/// Undo the common double-encoding artefacts seen in exported budgets.
pub fn repair_mojibake(raw: &str) -> String {
    if !raw.contains('Ã') && !raw.contains('â') && !raw.contains('Â') {
        return raw.to_string();
    }
    MOJIBAKE
        .iter()
        .fold(raw.to_string(), |acc, (bad, good)| acc.replace(bad, good))
}

/// Sanitize one cell or line of extracted text.
/// Strips control characters, repairs mojibake, collapses whitespace (including
/// non-breaking spaces used as thousands separators) to single spaces.
pub fn sanitize_cell_text(raw: &str) -> String {
    let repaired = repair_mojibake(raw);
    repaired
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{202F}' | '\u{2007}' | '\t' => ' ',
            other => other,
        })
        .filter(|c| !c.is_control() || *c == '\n')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-case and strip Portuguese/Latin-1 diacritics, for vocabulary matching.
pub fn fold_accents(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
