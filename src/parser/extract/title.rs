const SMALL_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "into", "nor", "of", "on",
    "or", "the", "to", "via", "vs", "with",
];

const ROMAN_NUMERALS: &[&str] = &[
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X",
];

/// Course name from the text between code and credits marker.
pub fn extract(segment: &str) -> String {
    titlecase(segment.trim())
}

/// Title-case a course name.
///
/// Source capitalization is inconsistent ("ART HISTORY", "art history"), so
/// every word is rebuilt: connector words stay lowercase unless first, roman
/// numerals and dotted abbreviations stay uppercase, and each hyphen-separated
/// part of a word is capitalized on its own.
pub fn titlecase(text: &str) -> String {
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| titlecase_word(word, i == 0))
        .collect::<Vec<_>>()
        .join(" ")
}

fn titlecase_word(word: &str, first: bool) -> String {
    let lower = word.to_lowercase();
    if !first && SMALL_WORDS.contains(&lower.as_str()) {
        return lower;
    }

    let upper = word.to_uppercase();
    if ROMAN_NUMERALS.contains(&upper.as_str()) || is_dotted_abbreviation(word) {
        return upper;
    }

    word.split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("-")
}

/// "U.S.", "A.A.S."
fn is_dotted_abbreviation(word: &str) -> bool {
    word.len() >= 4
        && word.ends_with('.')
        && word
            .split('.')
            .filter(|p| !p.is_empty())
            .all(|p| p.chars().count() == 1 && p.chars().all(char::is_alphabetic))
}

/// Uppercase the first letter, lowercase the letters after it. Leading
/// punctuation such as "(" is kept as is.
fn capitalize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut seen_letter = false;
    for c in part.chars() {
        if c.is_alphabetic() {
            if seen_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
                seen_letter = true;
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenated_parts_capitalized() {
        assert_eq!(titlecase("Art History-IS"), "Art History-Is");
    }

    #[test]
    fn shouting_and_lowercase_sources() {
        assert_eq!(titlecase("INTRODUCTION TO THE THEATRE"), "Introduction to the Theatre");
        assert_eq!(titlecase("history of the pacific northwest"), "History of the Pacific Northwest");
    }

    #[test]
    fn first_word_always_capitalized() {
        assert_eq!(titlecase("the american novel"), "The American Novel");
    }

    #[test]
    fn roman_numerals_upper() {
        assert_eq!(titlecase("english composition ii"), "English Composition II");
        assert_eq!(titlecase("Drawing I"), "Drawing I");
    }

    #[test]
    fn abbreviations_and_punctuation() {
        assert_eq!(titlecase("u.s. history"), "U.S. History");
        assert_eq!(titlecase("(special) TOPICS"), "(Special) Topics");
    }

    #[test]
    fn extract_trims_and_collapses() {
        assert_eq!(extract("  web   design "), "Web Design");
        assert_eq!(extract(""), "");
    }
}
