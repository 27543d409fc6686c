//! Book filename conventions.
//!
//! Catalog files are named `Title_Words_Author_Parts.txt`, with the author in
//! Gutenberg "Last, First" order and the comma dropped. When a book is only
//! known by its filename, the title and author are recovered from that name.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::BookRecord;

static BCE_RANGE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+\s*[-–]?\s*\d*\s*BCE").ok());
static TRAILING_BCE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s+BCE.*$").ok());
static UNKNOWN_AUTHOR: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\s*([\d\s?–-]+|Unknown)$").ok());
static FILENAME_JUNK: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[^\w\s-]").ok());
static UNDERSCORE_RUNS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"_+").ok());
static EBOOK_ID: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/ebooks/(\d+)").ok());
static LIFE_SPAN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+[-–]\d+").ok());
static PARENTHETICAL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\([^)]*\)").ok());

fn is_match(pattern: &Option<Regex>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

fn replace_all<'t>(pattern: &Option<Regex>, text: &'t str, replacement: &str) -> Cow<'t, str> {
    match pattern {
        Some(re) => re.replace_all(text, replacement),
        None => Cow::Borrowed(text),
    }
}

/// Given names that mark the tail of a "Last_First_Middle" author segment.
///
/// Filenames whose author has no listed given name and no comma fall back to
/// the last token as the author, so `Siddhartha_Hesse_Hermann.txt` reads as
/// "Siddhartha Hesse" by "Hermann". Catalog rows carry the real author; this
/// only matters for books known by filename alone.
const GIVEN_NAMES: &[&str] = &[
    "Alexandre", "Allan", "Anne", "Anthony", "Arthur", "Bram", "Charles", "Charlotte", "Conan",
    "Daniel", "Dante", "David", "Edgar", "Edith", "Edward", "Elizabeth", "Emily", "Ernest",
    "Frances", "Francis", "Frank", "Franz", "Friedrich", "Fyodor", "Geoffrey", "George",
    "Gilbert", "Gustave", "Harriet", "Henry", "Herbert", "Herman", "Hodgson", "Honoré", "Jack",
    "Jacob", "James", "Jane", "Johann", "John", "Jonathan", "Joseph", "Jules", "Kate", "Kenneth",
    "Leo", "Lewis", "Louis", "Louisa", "Lucy", "Lyman", "Margaret", "Mark", "Mary", "Maud",
    "May", "Miguel", "Nathaniel", "Niccolò", "Oscar", "Percy", "Ralph", "Robert", "Rudyard",
    "Samuel", "Sinclair", "Thomas", "Victor", "Virginia", "Waldo", "Walt", "Walter",
    "Washington", "Wilhelm", "William", "Wolfgang",
];

fn is_given_name(token: &str) -> bool {
    let bare = token.trim_end_matches('.');
    let mut chars = bare.chars();
    let is_initial = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase());
    is_initial || GIVEN_NAMES.contains(&bare)
}

/// Lifespan pieces such as `1859-1930`, `751`, `BCE-651` or `BCE`.
fn is_date_token(token: &str) -> bool {
    let core = token.trim_matches(|c: char| c.is_ascii_digit() || matches!(c, '-' | '–' | '?'));
    if core.is_empty() {
        return token.chars().any(|c| c.is_ascii_digit());
    }
    matches!(core, "BCE" | "BC" | "CE" | "AD")
}

/// Split `CamelCaseWords` into spaced words.
///
/// Only applies when the first word is at least three letters, which leaves
/// names like `McCarthy` or `DeQuincey` intact.
fn split_camel_case(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let first_boundary = chars
        .windows(2)
        .position(|pair| pair[0].is_lowercase() && pair[1].is_uppercase());
    match first_boundary {
        Some(index) if index + 1 >= 3 => {}
        _ => return token.to_string(),
    }
    let mut out = String::with_capacity(token.len() + 4);
    for (index, ch) in chars.iter().enumerate() {
        if index > 0 && ch.is_uppercase() && chars[index - 1].is_lowercase() {
            out.push(' ');
        }
        out.push(*ch);
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Index of the first author token in `tokens[..end]`.
fn author_start(tokens: &[&str], end: usize) -> usize {
    if let Some(index) = (1..end).rev().find(|&i| tokens[i].ends_with(',')) {
        return index;
    }
    let given_run_start = |from: usize| {
        let mut start = from;
        while start >= 3 && is_given_name(tokens[start - 1]) {
            start -= 1;
        }
        start
    };
    let run_start = given_run_start(end);
    if run_start < end {
        return run_start - 1;
    }
    // Up to two unlisted trailing middle names, as in `Shelley_Mary_Wollstonecraft`.
    let known_given = (end.saturating_sub(3).max(2)..end - 1)
        .rev()
        .find(|&i| is_given_name(tokens[i]));
    if let Some(given) = known_given {
        let start = given_run_start(given + 1);
        if tokens[start - 1].chars().next().is_some_and(char::is_uppercase) {
            return start - 1;
        }
    }
    end - 1
}

/// Clean an author token recovered from a filename.
///
/// Rules apply in order: a BCE date range means Homer, any other trailing
/// `BCE...` text is dropped, numeric or `Unknown` authors become `Unknown`,
/// and `Last, First` is reordered to `First Last`.
#[must_use]
pub fn clean_author_token(raw: &str) -> String {
    let author = collapse_whitespace(&raw.replace('_', " "));
    if is_match(&BCE_RANGE, &author) {
        return "Homer".to_string();
    }
    let author = replace_all(&TRAILING_BCE, &author, "").into_owned();
    if author.trim().is_empty() || is_match(&UNKNOWN_AUTHOR, &author) {
        return "Unknown".to_string();
    }
    if author.contains(',') {
        let parts: Vec<&str> = author.split(',').map(str::trim).collect();
        let reordered = if parts.len() == 2 {
            format!("{} {}", parts[1], parts[0])
        } else {
            parts.join(" ")
        };
        return collapse_whitespace(&reordered);
    }
    collapse_whitespace(&author)
}

/// Recover `{title, author}` from a `Title_Author.txt` filename.
#[must_use]
pub fn parse_book_filename(filename: &str) -> BookRecord {
    let stem = filename.strip_suffix(".txt").unwrap_or(filename);
    let tokens: Vec<&str> = stem.split('_').filter(|t| !t.trim().is_empty()).collect();

    let mut end = tokens.len();
    while end > 0 && is_date_token(tokens[end - 1]) {
        end -= 1;
    }
    let lifespan = tokens[end..].join(" ");
    // A lone number is the author field itself, not a lifespan.
    let bare_number = end < tokens.len()
        && tokens[end..]
            .iter()
            .all(|t| t.chars().all(|c| c.is_ascii_digit()));

    let (title_tokens, author_tokens, lifespan_in_segment) = if bare_number || end <= 1 {
        (&tokens[..end], &tokens[end..], true)
    } else {
        let start = author_start(&tokens, end);
        (&tokens[..start], &tokens[start..end], false)
    };

    let title = collapse_whitespace(
        &title_tokens
            .iter()
            .map(|t| split_camel_case(t))
            .collect::<Vec<_>>()
            .join(" "),
    );

    let segment = match author_tokens {
        [single] => split_camel_case(single),
        [surname, given @ ..] if !surname.ends_with(',') && !given.is_empty() => {
            format!("{surname}, {}", given.join(" "))
        }
        many => many.join(" "),
    };
    let raw_author = if !lifespan_in_segment && lifespan.contains("BCE") {
        format!("{segment} {lifespan}")
    } else {
        segment
    };

    let record = BookRecord {
        source_id: Some(filename.to_string()),
        ..BookRecord::new(&title, &clean_author_token(&raw_author))
    };
    log::debug!(
        "parsed {filename} as {:?} by {:?}",
        record.title,
        record.author
    );
    record
}

/// Turn free text into a filename-safe stem.
#[must_use]
pub fn clean_filename(text: &str) -> String {
    let stripped = replace_all(&FILENAME_JUNK, text, "");
    let underscored = stripped.replace(' ', "_");
    replace_all(&UNDERSCORE_RUNS, &underscored, "_")
        .trim_matches('_')
        .to_string()
}

/// Filename a book with this title and catalog author is stored under.
#[must_use]
pub fn book_filename(title: &str, author: &str) -> String {
    format!("{}_{}.txt", clean_filename(title), clean_filename(author))
}

/// Numeric ebook id from a Project Gutenberg book URL.
#[must_use]
pub fn extract_ebook_id(url: &str) -> Option<String> {
    EBOOK_ID
        .as_ref()?
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Strip life-span years and parenthetical notes from a scraped author.
#[must_use]
pub fn clean_scraped_author(raw: &str) -> String {
    let without_years = replace_all(&LIFE_SPAN, raw, "");
    let without_notes = replace_all(&PARENTHETICAL, &without_years, "");
    collapse_whitespace(&without_notes)
        .trim_matches(|c: char| matches!(c, ' ' | '.' | ','))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(filename: &str) -> (String, String) {
        let record = parse_book_filename(filename);
        (record.title, record.author)
    }

    #[test]
    fn study_in_scarlet_reorders_author() {
        assert_eq!(
            parsed("A_Study_in_Scarlet_Doyle_Arthur_Conan.txt"),
            (
                "A Study in Scarlet".to_string(),
                "Arthur Conan Doyle".to_string()
            )
        );
    }

    #[test]
    fn iliad_date_range_resolves_to_homer() {
        assert_eq!(
            parsed("The_Iliad_Homer_751_BCE-651_BCE.txt"),
            ("The Iliad".to_string(), "Homer".to_string())
        );
    }

    #[test]
    fn bundled_titles_parse_cleanly() {
        let cases = [
            (
                "SimpleSabotageFieldManual_OfficeOfStrategicServices.txt",
                "Simple Sabotage Field Manual",
                "Office Of Strategic Services",
            ),
            ("Ulysses_JamesJoyce.txt", "Ulysses", "James Joyce"),
            ("Middlemarch_GeorgeEliot.txt", "Middlemarch", "George Eliot"),
            (
                "Romeo_and_Juliet_Shakespeare_William.txt",
                "Romeo and Juliet",
                "William Shakespeare",
            ),
            (
                "The_Scarlet_Letter_Hawthorne_Nathaniel.txt",
                "The Scarlet Letter",
                "Nathaniel Hawthorne",
            ),
            (
                "The_Blue_Castle_a_novel_Montgomery_L_M.txt",
                "The Blue Castle a novel",
                "L M Montgomery",
            ),
            (
                "Wuthering_Heights_Brontë_Emily.txt",
                "Wuthering Heights",
                "Emily Brontë",
            ),
            (
                "Beowulf_An_Anglo-Saxon_Epic_Poem_Unknown.txt",
                "Beowulf An Anglo-Saxon Epic Poem",
                "Unknown",
            ),
        ];
        for (filename, title, author) in cases {
            assert_eq!(
                parsed(filename),
                (title.to_string(), author.to_string()),
                "{filename}"
            );
        }
    }

    #[test]
    fn comma_in_filename_marks_surname() {
        assert_eq!(
            parsed("Emma_Austen,_Jane.txt"),
            ("Emma".to_string(), "Jane Austen".to_string())
        );
    }

    #[test]
    fn unlisted_middle_name_keeps_author_together() {
        assert_eq!(
            parsed("Frankenstein_Shelley_Mary_Wollstonecraft.txt"),
            (
                "Frankenstein".to_string(),
                "Mary Wollstonecraft Shelley".to_string()
            )
        );
        assert_eq!(
            parsed("The_Life_of_Henry_Smith.txt"),
            ("The Life of Henry".to_string(), "Smith".to_string())
        );
    }

    #[test]
    fn unlisted_given_names_need_a_comma() {
        assert_eq!(
            parsed("Siddhartha_Hesse_Hermann.txt"),
            ("Siddhartha Hesse".to_string(), "Hermann".to_string())
        );
        assert_eq!(
            parsed("Siddhartha_Hesse,_Hermann.txt"),
            ("Siddhartha".to_string(), "Hermann Hesse".to_string())
        );
    }

    #[test]
    fn numeric_author_becomes_unknown() {
        assert_eq!(parsed("Old_Ballads_1850.txt").1, "Unknown");
        assert_eq!(parsed("Old_Ballads_Unknown.txt").1, "Unknown");
    }

    #[test]
    fn plain_lifespan_is_dropped() {
        assert_eq!(
            parsed("Dracula_Stoker_Bram_1847-1912.txt"),
            ("Dracula".to_string(), "Bram Stoker".to_string())
        );
    }

    #[test]
    fn author_token_rules_apply_in_order() {
        assert_eq!(clean_author_token("751 BCE-651 BCE"), "Homer");
        assert_eq!(clean_author_token("Virgil BCE 70"), "Virgil");
        assert_eq!(clean_author_token("1850"), "Unknown");
        assert_eq!(clean_author_token("Unknown"), "Unknown");
        assert_eq!(clean_author_token("Doyle,_Arthur_Conan"), "Arthur Conan Doyle");
        assert_eq!(
            clean_author_token("Tolkien, J. R. R., Sir"),
            "Tolkien J. R. R. Sir"
        );
        assert_eq!(clean_author_token("  Mary   Shelley "), "Mary Shelley");
    }

    #[test]
    fn camel_case_split_keeps_short_prefixes() {
        assert_eq!(split_camel_case("JamesJoyce"), "James Joyce");
        assert_eq!(split_camel_case("McCarthy"), "McCarthy");
        assert_eq!(split_camel_case("Anglo-Saxon"), "Anglo-Saxon");
    }

    #[test]
    fn scraper_helpers() {
        assert_eq!(clean_filename("A Study in Scarlet!"), "A_Study_in_Scarlet");
        assert_eq!(clean_filename("Doyle, Arthur Conan"), "Doyle_Arthur_Conan");
        assert_eq!(clean_filename("  spaced   out "), "spaced_out");
        assert_eq!(
            book_filename("A Study in Scarlet", "Doyle, Arthur Conan"),
            "A_Study_in_Scarlet_Doyle_Arthur_Conan.txt"
        );
        assert_eq!(
            extract_ebook_id("https://www.gutenberg.org/ebooks/244"),
            Some("244".to_string())
        );
        assert_eq!(extract_ebook_id("https://example.org/books/1"), None);
        assert_eq!(
            clean_scraped_author("Doyle, Arthur Conan, 1859-1930"),
            "Doyle, Arthur Conan"
        );
        assert_eq!(
            clean_scraped_author("Carroll, Lewis (Charles Lutwidge Dodgson)."),
            "Carroll, Lewis"
        );
    }
}
