//! Built-in catalogue data: songbook prefixes, the fixed set of liturgical
//! themes, the songs a fresh library is seeded with, and the chord/marker
//! palettes offered by the editor.

use crate::models::{Song, Theme};

/// Songbook reference prefixes and the book titles they abbreviate.
pub const BOOKS: &[(&str, &str)] = &[
    ("K", "Kékkönyv"),
    ("D", "Dúrkönyv"),
    ("SK", "Sárgakönyv"),
    ("Z", "Zöld könyv"),
    ("E", "Emmanuel"),
    ("SZ", "Szent vagy Uram"),
];

/// Chords offered for quick insertion in the song editor.
pub const COMMON_CHORDS: &[&str] = &[
    "C", "G", "D", "A", "E", "H", "F#", "F", "B", "Em", "Am", "Dm",
];

/// Verse markers offered for quick insertion in the song editor.
pub const VERSE_MARKERS: &[&str] = &[
    "[V1]", "[V2]", "[V3]", "[V4]", "[C]", "[B]", "[I]", "[O]", "[P]",
];

const THEMES: &[(&str, &str)] = &[
    ("theme_bevonulas", "Bevonulási ének"),
    ("theme_kyrie", "Kyrie"),
    ("theme_gloria", "Gloria"),
    ("theme_valaszos_zsoltar", "Válaszos zsoltár"),
    ("theme_alleluja", "Alleluja"),
    ("theme_felajanlas", "Felajánlási ének"),
    ("theme_sanctus", "Sanctus"),
    ("theme_pater_noster", "Pater noster"),
    ("theme_agnus_dei", "Agnus Dei"),
    ("theme_aldozas", "Áldozási ének"),
    ("theme_kivonulas", "Kivonulási ének"),
    ("theme_egyeb", "Egyéb"),
];

/// Prefix for a songbook title, e.g. `Kékkönyv` → `K`.
pub fn book_prefix(name: &str) -> Option<&'static str> {
    BOOKS
        .iter()
        .find(|(_, title)| *title == name)
        .map(|(prefix, _)| *prefix)
}

/// The liturgical themes in service order.
pub fn default_themes() -> Vec<Theme> {
    THEMES
        .iter()
        .map(|(id, title)| Theme {
            id: id.to_string(),
            title: title.to_string(),
        })
        .collect()
}

/// Songs a brand new library starts with.
pub fn default_songs() -> Vec<Song> {
    vec![
        Song {
            id: "amint_vagyok.xml".to_string(),
            title: "Amint vagyok".to_string(),
            author: Some("Ismeretlen".to_string()),
            content: "[V1]
Amint vagyok, csak úgy, mint egy semmire méltó,
.C          G              Am           F
De mert szavadra hittel jövök hozzád, bűnös lelkemet
.C              G              C               F
Te, Isten Báránya, fogadj el!
.   C      G        C"
                .to_string(),
            references: vec!["K123".to_string()],
        },
        Song {
            id: "jezus_eletem.xml".to_string(),
            title: "Jézus életem".to_string(),
            author: Some("Ismeretlen".to_string()),
            content: "[C]
Jézus életem, erőm, békém,
.G    D      Em   C
Jézus társam, örömöm.
.G    D      Em   C
Benned bízom, Te vagy az Úr,
.G          D        Em
Már nem éhezemszomjazom.
.C            D
Te vagy az én egyetlen kincsem,
.G            D          Em
Nincs más rajtad kívül,
.C            D
Kitől annyi jót kapnék.
.G        D        Em  C
Te vagy a legdrább barát!
.G            D       G"
                .to_string(),
            references: vec!["D17".to_string(), "SK28".to_string()],
        },
        Song {
            id: "szent_vagy_mindorokke.xml".to_string(),
            title: "Szent vagy mindörökké".to_string(),
            author: Some("Ismeretlen".to_string()),
            content: "[V1]
Szent vagy, szent vagy, szent vagy, mindenség Ura, Istene!
.C         G         Am        F         C        G       C
Dicsőséged betölti a mennyet és a földet.
.F        C      Dm          G         C
Hozsanna a magasságban!
.F        G          C
[V2]
Áldott, aki jön az Úr nevében.
.F     C     Dm   G      C
Hozsanna a magasságban!
.F        G          C"
                .to_string(),
            references: vec!["Z244".to_string(), "K31".to_string()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song_text::parse_to_verses;

    #[test]
    fn book_prefix_maps_titles() {
        assert_eq!(book_prefix("Sárgakönyv"), Some("SK"));
        assert_eq!(book_prefix("Unknown"), None);
    }

    #[test]
    fn default_songs_have_unique_xml_ids_and_parse() {
        let songs = default_songs();
        for song in &songs {
            assert!(song.id.ends_with(".xml"));
            assert!(!parse_to_verses(&song.content).is_empty());
        }
        let mut ids: Vec<&str> = songs.iter().map(|s| s.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert_eq!(parse_to_verses(&songs[2].content).len(), 2);
    }

    #[test]
    fn twelve_themes_in_service_order() {
        let themes = default_themes();
        assert_eq!(themes.len(), 12);
        assert_eq!(themes[1].title, "Kyrie");
        assert_eq!(themes[11].id, "theme_egyeb");
    }
}
