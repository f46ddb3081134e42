//! Bundled slide sets shown for trainings that have no authored slides yet
//! but whose title names a well-known topic.

use serde::{Deserialize, Serialize};

use crate::content::{serialize, Block, BlockId, BlockKind, HeadingLevel, Severity};
use crate::models::{Slide, SlideKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackSet {
    FieldVisit,
    Reporting,
    Orientation,
}

impl FallbackSet {
    pub const ALL: [FallbackSet; 3] = [Self::FieldVisit, Self::Reporting, Self::Orientation];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::FieldVisit => &["saha", "ziyaret", "field visit"],
            Self::Reporting => &["rapor", "report"],
            Self::Orientation => &["oryantasyon", "orientation", "uyum"],
        }
    }

    /// First set, in declaration order, with a keyword contained in the
    /// title. Case-insensitive.
    pub fn match_title(title: &str) -> Option<Self> {
        let title = title.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|set| set.keywords().iter().any(|k| title.contains(k)))
    }

    pub fn slides(&self) -> Vec<Slide> {
        match self {
            Self::FieldVisit => vec![
                slide(
                    "Ziyaret Öncesi",
                    "5 dk",
                    vec![
                        heading("Hazırlık"),
                        para("Noktanın son raporunu ve açık görevleri gözden geçirin."),
                        list(&["Kimlik kartı", "Ziyaret formu", "Şarjlı telefon"]),
                    ],
                ),
                slide(
                    "Sahada",
                    "10 dk",
                    vec![
                        heading("Gözlem"),
                        para("Durumu yerinde gözlemleyin ve fotoğraflarla belgeleyin."),
                        alert(
                            Severity::Warning,
                            "Güvenlik",
                            "Riskli alanlara tek başınıza girmeyin.",
                        ),
                    ],
                ),
                slide(
                    "Ziyaret Sonrası",
                    "5 dk",
                    vec![
                        heading("Kayıt"),
                        para("Ziyaret durumunu aynı gün panele işleyin."),
                    ],
                ),
            ],
            Self::Reporting => vec![
                slide(
                    "Rapor Yapısı",
                    "5 dk",
                    vec![
                        heading("Bölümler"),
                        list(&["Özet", "Bulgular", "Öneriler"]),
                    ],
                ),
                slide(
                    "İyi Rapor",
                    "5 dk",
                    vec![
                        para("Kısa cümleler kurun, her bulguyu bir kanıtla destekleyin."),
                        alert(Severity::Info, "İpucu", "Tarih ve yer bilgisini her zaman ekleyin."),
                    ],
                ),
            ],
            Self::Orientation => vec![
                slide(
                    "Hoş Geldiniz",
                    "3 dk",
                    vec![
                        heading("Ekibe hoş geldiniz"),
                        para("Bu eğitim panelin temel işleyişini tanıtır."),
                    ],
                ),
                slide(
                    "Roller",
                    "5 dk",
                    vec![
                        heading("Kim ne yapar?"),
                        list(&[
                            "Admin: kullanıcıları ve eğitimleri yönetir",
                            "Sorumlu: birimini yönetir, görev verir",
                            "Koordinatör: sahadaki işleri yürütür",
                            "İzleyici: yalnızca görüntüler",
                        ]),
                    ],
                ),
                slide(
                    "Görevler",
                    "4 dk",
                    vec![
                        para("Size gelen görevleri açtığınızda okundu olarak işaretlenir."),
                        alert(Severity::Success, "", "Görevi bir notla tamamlamayı unutmayın."),
                    ],
                ),
            ],
        }
    }
}

fn slide(title: &str, duration: &str, kinds: Vec<BlockKind>) -> Slide {
    let blocks: Vec<Block> = kinds
        .into_iter()
        .enumerate()
        .map(|(i, kind)| Block::new(BlockId(i as u64 + 1), kind))
        .collect();
    Slide {
        kind: SlideKind::Text,
        duration: duration.to_string(),
        content: serialize(&blocks),
        ..Slide::new(title)
    }
}

fn heading(text: &str) -> BlockKind {
    BlockKind::Heading {
        text: text.to_string(),
        level: HeadingLevel::H2,
    }
}

fn para(text: &str) -> BlockKind {
    BlockKind::Paragraph {
        text: text.to_string(),
    }
}

fn list(items: &[&str]) -> BlockKind {
    BlockKind::List {
        items: items.iter().map(|s| s.to_string()).collect(),
    }
}

fn alert(severity: Severity, title: &str, text: &str) -> BlockKind {
    BlockKind::Alert {
        severity,
        title: Some(title.to_string()),
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_match_keywords_case_insensitively() {
        assert_eq!(FallbackSet::match_title("SAHA Çalışması"), Some(FallbackSet::FieldVisit));
        assert_eq!(FallbackSet::match_title("Aylık Rapor"), Some(FallbackSet::Reporting));
        assert_eq!(
            FallbackSet::match_title("New hire orientation"),
            Some(FallbackSet::Orientation)
        );
        assert_eq!(FallbackSet::match_title("İlk Yardım"), None);
    }

    #[test]
    fn bundled_slides_are_rendered_markup() {
        for set in FallbackSet::ALL {
            let slides = set.slides();
            assert!(!slides.is_empty());
            assert!(slides.iter().all(|s| !s.content.is_empty()));
        }
        let reporting = FallbackSet::Reporting.slides();
        assert_eq!(
            reporting[0].content,
            "<h2>Bölümler</h2><ul><li>Özet</li><li>Bulgular</li><li>Öneriler</li></ul>"
        );
    }
}
