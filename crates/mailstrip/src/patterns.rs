//! The ordered table of quote-header patterns.
//!
//! Order is significant: `find_quote_header` returns the first pattern that
//! matches anywhere in the text, in table order — not the earliest match by
//! position. The table covers "On DATE, NAME wrote:"-style headers in a dozen
//! languages, Outlook 2019 localizations, date-first numeric headers, and the
//! dash-delimited "Original Message" family.

use regex::Regex;
use std::sync::OnceLock;

/// A compiled header pattern tagged by the locale/client convention it covers.
pub struct QuotePattern {
    pub convention: &'static str,
    pub re: Regex,
}

/// Location of a matched quote header within flattened text. Ephemeral:
/// consumed immediately by the boundary mapper.
#[derive(Debug, Clone)]
pub struct MatchSpan {
    /// Byte offset of the match start.
    pub start: usize,
    /// The matched header substring.
    pub text: String,
}

const TABLE: &[(&str, &str)] = &[
    // On DATE, NAME <EMAIL> wrote: / In a message dated DATE, NAME sent:
    (
        "en",
        r"(?im)^>*-*\s*((on|in a message dated)\s.+\s.+?(wrote|sent)\s*:)\s?-*",
    ),
    // Le DATE, NAME a écrit :
    ("fr", r"(?im)^>*-*\s*((le)\s.+\s.+?(écrit)\s*:)\s?"),
    // El DATE, NAME escribió:
    ("es", r"(?im)^>*-*\s*((el)\s.+\s.+?(escribió)\s*:)\s?"),
    // Il DATE, NAME ha scritto:
    ("it", r"(?im)^>*-*\s*((il)\s.+\s.+?(scritto)\s*:)\s?"),
    // Em DATE, NAME escreveu:
    ("pt", r"(?im)^>*-*\s*((em)\s.+\s.+?(escreveu)\s*:)\s?"),
    // Am DATE schrieb NAME <EMAIL>:
    ("de", r"(?im)^\s*(am\s.+\s)schrieb.+\s?(\[|<).+(\]|>):"),
    // Op DATE schreef NAME <EMAIL>:
    ("nl", r"(?im)^\s*(op\s[\s\S]+?(schreef|verzond|geschreven)[\s\S]+:)"),
    // W dniu DATE, NAME pisze|napisał:
    ("pl", r"(?im)^\s*((w\sdniu|dnia)\s[\s\S]+?(pisze|napisał(\(a\))?):)"),
    // Den DATE skrev "NAME" <EMAIL>:
    ("sv-da", r#"(?im)^\s*(den|d.)?\s?.+\s?skrev\s?".+"\s*[\[|<].+[\]|>]\s?:"#),
    // Vào DATE đã viết NAME <EMAIL>:
    ("vi", r"(?im)^\s*(vào\s.+\sđã viết\s.+:)"),
    // Outlook 2019 localizations.
    ("outlook-no", r"(?m)^\s?.+\s*[\[|<].+[\]|>]\s?skrev følgende den\s?.+\s?:"),
    ("outlook-cz", r"(?im)^\s?dne\s?.+,\s?.+\s*[\[|<].+[\]|>]\s?napsal\(a\)\s?:"),
    (
        "outlook-ru",
        r#"(?im)^\s?.+\s?пользователь\s?".+"\s*[\[|<].+[\]|>]\s?написал\s?:"#,
    ),
    (
        "outlook-sk",
        r"(?im)^\s?.+\s?používateľ\s?.+\s*\([\[|<].+[\]|>]\)\s?napísal\s?:",
    ),
    (
        "outlook-sv",
        r#"(?m)\s?Den\s?.+\s?skrev\s?".+"\s*[\[|<].+[\]|>]\s?følgende\s?:"#,
    ),
    (
        "outlook-tr",
        r#"(?im)^\s?".+"\s*[\[|<].+[\]|>],\s?.+\s?tarihinde şunu yazdı\s?:"#,
    ),
    (
        "outlook-hu",
        r"(?im)^\s?.+\s?időpontban\s?.+\s*[\[|<|(].+[\]|>|)]\s?ezt írta\s?:",
    ),
    // pe DATE NAME kirjoitti:
    ("fi", r"(?im)^\s*(pe\s.+\s.+kirjoitti:)"),
    // 在 DATE, NAME 写道：
    ("zh", r"(?m)^(在[\s\S]+写道：)"),
    // NAME <EMAIL> schrieb:
    ("de-bare", r"(?im)^(.+\s<.+>\sschrieb\s?:)"),
    // NAME on DATE at TIME wrote:
    ("en-bare", r"(?im)^(.+\son.*at.*wrote:)"),
    // From: NAME <EMAIL> (and van/de/von/da localizations).
    (
        "from-header",
        r"(?im)^\s*((from|van|de|von|da)\s?:.+\s?\n?\s*(\[|<).+(\]|>))",
    ),
    // DATE TIME NAME 작성:
    ("ko", r"(?m)^(20[0-9]{2}\..+\s작성:)$"),
    // DATE TIME、NAME のメッセージ:
    ("ja", r"(?m)^(20[0-9]{2}/.+のメッセージ:)"),
    // 20YY-MM-DD HH:II NAME <EMAIL>:
    (
        "date-iso",
        r"(?m)^(20[0-9]{2})-([0-9]{2}).([0-9]{2}).([0-9]{2}):([0-9]{2})\n?(.*)>:",
    ),
    // DD.MM.20YY HH:II NAME "<EMAIL>":
    (
        "date-dotted",
        r#"(?m)^([0-9]{2}).([0-9]{2}).(20[0-9]{2})(.*)(([0-9]{2}).([0-9]{2}))(.*)"( *)<(.*)>( *):"#,
    ),
    // HH:II, DATE, NAME <EMAIL>:
    (
        "time-first",
        r#"(?m)^[0-9]{2}:[0-9]{2}(.*)[0-9]{4}(.*)"( *)<(.*)>( *):"#,
    ),
    // 02.04.2012 14:20 пользователь "bob@example.com" <bob@example.com>:
    ("date-loose", r"(?s)(\d+/\d+/\d+|\d+\.\d+\.\d+).*\s\S+@\S+:"),
    // 2014-10-17 11:28 GMT+03:00 Bob <bob@example.com>:
    ("date-gmt", r"(?is)\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}\s+GMT.*\s\S+@\S+:"),
    // Thu, 26 Jun 2014 14:00:51 +0400 Bob <bob@example.com>:
    (
        "date-rfc",
        r"\S{3,10}, \d\d? \S{3,10} 20\d\d,? \d\d?:\d\d(:\d\d)?( \S+){3,6}@\S+:",
    ),
    // martes, 8 de abril de 2025, 9:56:16 -0400, NAME <EMAIL>:
    (
        "es-weekday",
        r"(?is)(lunes|martes|miércoles|miercoles|jueves|viernes|sábado|sabado|domingo),\s*\d{1,2}\s+de\s+[A-Za-záéíóúñ]+(?:\s+de)?\s+20\d{2},\s*\d{1,2}:\d{2}:\d{2}\s+[+-]\d{4},\s+.+\s<[^>]+>:\s*",
    ),
    // ----- Original Message ----- and friends.
    (
        "dash-delimited",
        r"(?im)^>?\s*-{3,12}\s*(original message|reply message|original text|message d'origine|original email|ursprüngliche nachricht|original meddelelse|original besked|original meddelande|originalbericht|originalt meddelande|originalt melding|alkuperäinen viesti|originalna poruka|originalna správa|originálna správa|originální zpráva|původní zpráva|antwort nachricht|oprindelig besked|oprindelig meddelelse)\s*-{3,12}\s*",
    ),
];

/// The compiled table, built once per process. Read-only after init, so
/// concurrent engine instances can share it.
pub fn patterns() -> &'static [QuotePattern] {
    static PATTERNS: OnceLock<Vec<QuotePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        TABLE
            .iter()
            .map(|&(convention, src)| QuotePattern {
                convention,
                re: Regex::new(src).expect("static quote-header pattern must compile"),
            })
            .collect()
    })
}

/// First pattern (in table order) matching anywhere in `text`.
pub fn find_quote_header(text: &str) -> Option<MatchSpan> {
    for pattern in patterns() {
        if let Some(m) = pattern.re.find(text) {
            return Some(MatchSpan {
                start: m.start(),
                text: m.as_str().to_string(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_table_entries_compile() {
        assert_eq!(patterns().len(), TABLE.len());
    }

    #[test]
    fn english_on_wrote_matches_at_line_start() {
        let text = "Hi there\nOn Mon, Jan 1, 2024 at 9:00 AM Jane <jane@x.com> wrote:\nOld stuff";
        let span = find_quote_header(text).expect("header should match");
        assert_eq!(span.start, "Hi there\n".len());
        assert!(span.text.starts_with("On Mon"));
    }

    #[test]
    fn table_order_wins_over_position_order() {
        // A French header earlier in the text than an English one: the English
        // pattern sits first in the table, so it wins even though it matches
        // later by position.
        let text = "corps\nLe 1 janvier 2024, Jean a écrit :\nmilieu\nOn Jan 1, 2024, John Doe wrote:\nold";
        let span = find_quote_header(text).unwrap();
        assert!(span.text.contains("wrote:"), "got {:?}", span.text);
    }

    #[test]
    fn no_match_returns_none() {
        assert!(find_quote_header("just a normal message\nwith two lines").is_none());
    }

    #[test]
    fn dash_delimited_original_message_variants() {
        for header in [
            "----- Original Message -----",
            "------ Ursprüngliche Nachricht ------",
            "--- Message d'origine ---",
            "> ----- Původní zpráva -----",
        ] {
            let text = format!("Reply body\n{header}\nquoted");
            let span = find_quote_header(&text)
                .unwrap_or_else(|| panic!("no match for {header:?}"));
            assert_eq!(span.start, "Reply body\n".len(), "start for {header:?}");
        }
    }

    #[test]
    fn every_pattern_has_a_matching_exemplar() {
        // One synthetic header per table entry, in table order. Each must be
        // found when embedded after unrelated body text.
        let exemplars: &[(&str, &str)] = &[
            ("en", "On Mon, 1 Jan 2024 at 9:00, John Doe wrote:"),
            ("fr", "Le 1 janvier 2024 à 10:00, Jean Dupont a écrit :"),
            ("es", "El 1 ene 2024, Juan Pérez escribió:"),
            ("it", "Il 1 gen 2024, Mario Rossi ha scritto:"),
            ("pt", "Em 1 de jan de 2024, João Silva escreveu:"),
            ("de", "Am 01.01.2024 um 10:00 schrieb Hans Meier <hans@example.com>:"),
            ("nl", "Op 1 jan. 2024 om 10:00 schreef Jan Jansen <jan@example.com>:"),
            ("pl", "W dniu 01.01.2024 o 10:00 Jan Kowalski napisał:"),
            ("sv-da", "Den 1 jan. 2024 10:00 skrev \"Sven Svensson\" <sven@example.com>:"),
            ("vi", "Vào 1 thg 1, 2024 đã viết Nguyen Van <nv@example.com>:"),
            (
                "outlook-no",
                "Ola Nordmann <ola@example.com> skrev følgende den 1. januar 2024:",
            ),
            ("outlook-cz", "Dne 01.01.2024, Karel Novák <karel@example.com> napsal(a):"),
            (
                "outlook-ru",
                "01.01.2024 10:00 пользователь \"Иван Иванов\" <ivan@example.com> написал:",
            ),
            (
                "outlook-sk",
                "01.01.2024 10:00 používateľ Ján Novák (<jan@example.com>) napísal:",
            ),
            ("outlook-sv", "Den 1 januari 2024 skrev \"Sven\" <sven@example.com> følgende:"),
            (
                "outlook-tr",
                "\"Ahmet Yılmaz\" <ahmet@example.com>, 1 Oca 2024 tarihinde şunu yazdı:",
            ),
            (
                "outlook-hu",
                "2024. 01. 01. 10:00 időpontban Kovács János <janos@example.com> ezt írta:",
            ),
            ("fi", "pe 1. tammik. 2024 klo 10.00 Matti Meikäläinen kirjoitti:"),
            ("zh", "在 2024年1月1日 10:00，张三 写道："),
            ("de-bare", "Hans Meier <hans@example.com> schrieb:"),
            ("en-bare", "John Doe on Mon at 9:00 wrote:"),
            ("from-header", "From: John Doe <john@example.com>"),
            ("ko", "2024. 1. 1. 오후 2:30 김철수 작성:"),
            ("ja", "2024/01/01 10:00、田中太郎 のメッセージ:"),
            ("date-iso", "2024-01-02 03:04 GMT+01:00 Bob <bob@example.com>:"),
            ("date-dotted", "02.04.2012 14:20 to \"Bob\" <bob@example.com> :"),
            ("time-first", "10:20 on 2024 by \"Bob\" <bob@example.com>:"),
            ("date-loose", "02.04.2012 14:20 \"bob\" <bob@xxx.example.org>:"),
            ("date-gmt", "2014-10-17 11:28 GMT+03:00 Bob <bob@example.com>:"),
            ("date-rfc", "Thu, 26 Jun 2014 14:00:51 +0400 Bob <bob@example.com>:"),
            (
                "es-weekday",
                "martes, 8 de abril de 2025, 9:56:16 -0400, Alice Bob <alice.b@example.com>:",
            ),
            ("dash-delimited", "----- Original Message -----"),
        ];
        assert_eq!(exemplars.len(), TABLE.len());
        for (convention, header) in exemplars {
            let text = format!("Hello.\n{header}\nOld quoted text.");
            let span = find_quote_header(&text)
                .unwrap_or_else(|| panic!("no pattern matched exemplar for {convention}"));
            // Unanchored patterns may consume the preceding newline, so
            // compare the truncation result rather than the raw offset.
            assert_eq!(
                text[..span.start].trim(),
                "Hello.",
                "truncation for {convention} must keep only the body"
            );
        }
    }
}
