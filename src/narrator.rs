//! Automatic operational narrative.
//!
//! Consumes the latest decision of a pipeline run plus the augmented grid's
//! BT/RCR/CI extrema and produces the narrative text shown on the dashboard
//! and stored in the event log. Pure formatting — no detection logic here.

use crate::grid::var;
use crate::pipeline::DetectionBundle;
use crate::types::AlertStatus;

/// Status-specific core sentence fragments.
fn level_text(status: AlertStatus) -> &'static str {
    match status {
        AlertStatus::Normal => "tidak terpantau adanya indikasi signifikan potensi puting beliung",
        AlertStatus::Caution => "terdapat peningkatan potensi kejadian cuaca ekstrem",
        AlertStatus::Warning => {
            "berpotensi terjadi cuaca ekstrem signifikan berupa puting beliung"
        }
    }
}

/// Build the operational narrative for one pipeline run.
///
/// The non-NORMAL variants append the supporting satellite evidence (coldest
/// cloud top, strongest cooling, peak composite index) and the standing
/// public advisory sentence.
pub fn narrate(bundle: &DetectionBundle, region: &str) -> String {
    let Some(latest) = bundle.latest() else {
        return format!(
            "Berdasarkan hasil pemantauan dinamika atmosfer dan citra satelit, \
             belum tersedia hasil analisis untuk wilayah {region} pada periode pengamatan."
        );
    };

    let waktu = latest.time.format("%d %B %Y pukul %H:%M UTC");
    let mut narasi = format!(
        "Berdasarkan hasil analisis dinamika atmosfer dan pengolahan data satelit, \
         terpantau {} di wilayah {} pada {}.",
        level_text(latest.status),
        region,
        waktu
    );

    if latest.status != AlertStatus::Normal {
        let bt_min = bundle.grid.field_min(var::BT);
        let rcr_max = bundle.grid.field_max(var::RCR);
        let ci_max = bundle.grid.field_max(var::CI);

        narasi.push_str(" Kondisi ini didukung oleh pertumbuhan awan konvektif signifikan");
        if let Some(bt) = bt_min {
            narasi.push_str(&format!(
                " dengan suhu puncak awan terendah {bt:.1} K"
            ));
        }
        if let Some(rcr) = rcr_max {
            narasi.push_str(&format!(
                ", laju pendinginan maksimum {rcr:.1} K/10 menit"
            ));
        }
        if let Some(ci) = ci_max {
            narasi.push_str(&format!(
                ", serta indeks komposit tertinggi {ci:.2}"
            ));
        }
        narasi.push('.');

        narasi.push_str(
            " Masyarakat diimbau untuk tetap waspada terhadap potensi \
             angin kencang sesaat, hujan lebat, dan fenomena cuaca ekstrem lainnya.",
        );
    }

    narasi
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::grid::Grid;
    use crate::pipeline::DetectionPipeline;
    use chrono::{TimeZone, Utc};

    fn run_bundle(bt_series: &[f64]) -> DetectionBundle {
        let times = (0..bt_series.len())
            .map(|i| {
                Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(10 * i as i64)
            })
            .collect();
        let mut grid = Grid::new(times, vec![-8.0], vec![112.0]).unwrap();
        grid.insert(var::BT, bt_series.to_vec()).unwrap();
        DetectionPipeline::new(DetectionConfig::default())
            .unwrap()
            .run(&grid)
            .unwrap()
    }

    #[test]
    fn test_normal_narrative_has_no_advisory() {
        let bundle = run_bundle(&[290.0, 290.0, 290.0]);
        let text = narrate(&bundle, "Jawa Timur");
        assert!(text.contains("tidak terpantau"));
        assert!(text.contains("Jawa Timur"));
        assert!(!text.contains("diimbau"));
    }

    #[test]
    fn test_warning_narrative_includes_evidence() {
        // Sustained plunge with ongoing cooling keeps the danger flag
        // through the temporal filter
        let bundle = run_bundle(&[290.0, 250.0, 210.0, 205.0]);
        assert_eq!(bundle.latest().unwrap().status, AlertStatus::Warning);

        let text = narrate(&bundle, "Jawa Timur");
        assert!(text.contains("puting beliung"));
        assert!(text.contains("suhu puncak awan terendah"));
        assert!(text.contains("indeks komposit"));
        assert!(text.contains("diimbau"));
    }

    #[test]
    fn test_narrative_names_the_observation_time() {
        let bundle = run_bundle(&[290.0, 290.0]);
        let text = narrate(&bundle, "Malang");
        assert!(text.contains("2026"));
        assert!(text.contains("UTC"));
        assert!(text.contains("Malang"));
    }
}
