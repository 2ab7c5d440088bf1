//! Dashboard chart data. Static: the numbers never change.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub label: Option<&'static str>,
    pub values: Vec<u32>,
    /// One color for the whole series, or one per value.
    pub colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chart {
    /// Canvas id on the dashboard.
    pub id: &'static str,
    pub kind: ChartKind,
    pub labels: Vec<&'static str>,
    pub dataset: Dataset,
}

const PALETTE: [&str; 5] = ["#4361ee", "#f72585", "#4cc9f0", "#7209b7", "#3a0ca3"];

/// System usage per weekday, in percent.
pub fn usage_chart() -> Chart {
    Chart {
        id: "usageChart",
        kind: ChartKind::Line,
        labels: vec!["Sen", "Sel", "Rab", "Kam", "Jum", "Sab", "Min"],
        dataset: Dataset {
            label: Some("Penggunaan Sistem"),
            values: vec![65, 59, 80, 81, 56, 55, 40],
            colors: vec![PALETTE[0]],
        },
    }
}

pub fn activity_chart() -> Chart {
    Chart {
        id: "activityChart",
        kind: ChartKind::Bar,
        labels: vec!["Pesan", "Tugas", "Presensi", "Nilai", "Forum"],
        dataset: Dataset {
            label: Some("Aktivitas"),
            values: vec![65, 59, 80, 81, 56],
            colors: PALETTE.to_vec(),
        },
    }
}

/// How study time is split, in percent.
pub fn time_chart() -> Chart {
    Chart {
        id: "timeChart",
        kind: ChartKind::Doughnut,
        labels: vec!["Belajar", "Tugas", "Forum", "Lainnya"],
        dataset: Dataset {
            label: None,
            values: vec![40, 25, 20, 15],
            colors: PALETTE[..4].to_vec(),
        },
    }
}

pub fn all_charts() -> [Chart; 3] {
    [usage_chart(), activity_chart(), time_chart()]
}
