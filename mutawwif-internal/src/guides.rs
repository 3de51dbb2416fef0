//! Static ritual guide content served by the guide lookup endpoint.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RitualGuide {
    pub key: &'static str,
    pub title: &'static str,
    pub summary: &'static str,
    pub steps: &'static [&'static str],
    #[serde(rename = "recommendedDuas", skip_serializing_if = "Option::is_none")]
    pub recommended_duas: Option<RecommendedDuas>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendedDuas {
    #[serde(rename = "generalArabic")]
    pub general_arabic: &'static str,
    pub transliteration: &'static str,
    #[serde(rename = "meaningId")]
    pub meaning_id: &'static str,
}

lazy_static! {
    static ref RITUAL_GUIDES: HashMap<&'static str, RitualGuide> = {
        let mut guides = HashMap::new();
        guides.insert(
            "tawaf",
            RitualGuide {
                key: "tawaf",
                title: "Tawaf al-Qudum / Tawaf al-Ifadah / Tawaf Wada'",
                summary: "Mengelilingi Ka'bah sebanyak 7 putaran, dimulai dari Hajar Aswad dan \
                          berlawanan arah jarum jam.",
                steps: &[
                    "Niat tawaf dalam hati sesuai jenis tawaf (qudum, ifadah, wada').",
                    "Mulai dari sejajar Hajar Aswad, angkat tangan seperti takbiratul ihram dan \
                     ucapkan takbir.",
                    "Lakukan 7 putaran berlawanan arah jarum jam, menjaga adab dan kekhusyukan.",
                    "Usahakan mendekat ke Multazam jika memungkinkan tanpa menyakiti orang lain.",
                    "Setelah selesai, shalat sunnah 2 rakaat di belakang Maqam Ibrahim jika \
                     memungkinkan.",
                ],
                recommended_duas: Some(RecommendedDuas {
                    general_arabic: "رَبَّنَا آتِنَا فِي الدُّنْيَا حَسَنَةً وَفِي الآخِرَةِ حَسَنَةً وَقِنَا عَذَابَ النَّارِ",
                    transliteration: "Rabbanaa aatina fi-d-dunyaa hasanah wa fi-l-aakhirati \
                                      hasanah wa qinaa 'adhaab an-naar.",
                    meaning_id: "Ya Rabb kami, berikanlah kepada kami kebaikan di dunia dan \
                                 kebaikan di akhirat, dan lindungilah kami dari azab neraka.",
                }),
            },
        );
        guides.insert(
            "sai",
            RitualGuide {
                key: "sai",
                title: "Sa'i antara Shafa dan Marwah",
                summary: "Berjalan dan berlari kecil antara bukit Shafa dan Marwah sebanyak 7 \
                          kali sebagai mengenang perjuangan Hajar.",
                steps: &[
                    "Mulai dari Shafa, menghadap Ka'bah, angkat tangan dan berdoa.",
                    "Turun menuju Marwah, berjalan dengan tenang dan penuh kekhusyukan.",
                    "Lakukan lari kecil (raml) di area hijau bagi laki-laki jika mampu.",
                    "Setiap sampai di Shafa atau Marwah, berdoa dan berdzikir.",
                    "Lengkapi 7 kali putaran (Shafa → Marwah dihitung 1).",
                ],
                recommended_duas: None,
            },
        );
        guides
    };
}

/// Look up a ritual guide by key. The lookup is case-insensitive.
pub fn ritual_guide(key: &str) -> Option<&'static RitualGuide> {
    RITUAL_GUIDES.get(key.to_lowercase().as_str())
}
