use crate::dom::Document;
use crate::theme::Palette;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CATEGORY_CANVAS: &str = "categoryDonutChart";
pub const TREND_CANVAS: &str = "trendChart";
pub const BUDGET_CANVAS: &str = "budgetComparisonChart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Doughnut,
    Line,
    Bar,
}

impl ChartKind {
    /// Cartesian charts get an x and a y axis; doughnuts have none.
    fn axes(self) -> &'static [&'static str] {
        match self {
            ChartKind::Doughnut => &[],
            ChartKind::Line | ChartKind::Bar => &["x", "y"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub background_color: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleOptions {
    pub grid_color: String,
    pub begin_at_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub legend_display: bool,
    pub legend_label_color: String,
    pub scales: BTreeMap<String, ScaleOptions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ChartId(pub u32);

/// A live chart instance. Restyling mutates it in place and bumps
/// `revision`, the stand-in for the library's `update()`.
#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub id: ChartId,
    pub canvas: String,
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
    pub revision: u32,
}

impl Chart {
    pub fn update(&mut self) {
        self.revision += 1;
    }

    pub fn apply_palette(&mut self, palette: &Palette) {
        self.options.legend_label_color = palette.legend_label.to_string();
        for scale in self.options.scales.values_mut() {
            scale.grid_color = palette.grid.to_string();
        }
    }
}

#[derive(Debug, Default)]
pub struct ChartRegistry {
    charts: Vec<Chart>,
    next_id: u32,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an instance styled with the library defaults.
    pub fn register(&mut self, canvas: &str, kind: ChartKind, data: ChartData, legend_display: bool) -> ChartId {
        self.next_id += 1;
        let id = ChartId(self.next_id);
        let defaults = Palette::light();
        let scales = kind
            .axes()
            .iter()
            .map(|axis| {
                (
                    axis.to_string(),
                    ScaleOptions {
                        grid_color: defaults.grid.to_string(),
                        begin_at_zero: *axis == "y",
                    },
                )
            })
            .collect();
        self.charts.push(Chart {
            id,
            canvas: canvas.to_string(),
            kind,
            data,
            options: ChartOptions {
                legend_display,
                legend_label_color: defaults.legend_label.to_string(),
                scales,
            },
            revision: 0,
        });
        id
    }

    pub fn get(&self, id: ChartId) -> Option<&Chart> {
        self.charts.iter().find(|chart| chart.id == id)
    }

    pub fn instances(&self) -> &[Chart] {
        &self.charts
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Recolours every live instance and asks each to redraw.
    pub fn restyle(&mut self, palette: &Palette) {
        for chart in &mut self.charts {
            chart.apply_palette(palette);
            chart.update();
        }
    }
}

/// Series the server renders into the dashboard page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardChartData {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub amounts: Vec<f64>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub months: Vec<String>,
    #[serde(default)]
    pub spending_trend: Vec<f64>,
    #[serde(default)]
    pub budget_amounts: Vec<f64>,
}

/// Builds one chart per canvas present on the page.
pub fn initialize_charts(doc: &Document, registry: &mut ChartRegistry, data: &DashboardChartData) -> Vec<ChartId> {
    let mut created = Vec::new();

    if doc.by_id(CATEGORY_CANVAS).is_some() {
        let chart = ChartData {
            labels: data.categories.clone(),
            datasets: vec![Dataset {
                label: None,
                data: data.amounts.clone(),
                background_color: data.colors.clone(),
                border_color: None,
            }],
        };
        created.push(registry.register(CATEGORY_CANVAS, ChartKind::Doughnut, chart, false));
    }

    if doc.by_id(TREND_CANVAS).is_some() {
        let chart = ChartData {
            labels: data.months.clone(),
            datasets: vec![Dataset {
                label: Some("Monthly Spending".to_string()),
                data: data.spending_trend.clone(),
                background_color: vec!["rgba(102, 126, 234, 0.1)".to_string()],
                border_color: Some("#667eea".to_string()),
            }],
        };
        created.push(registry.register(TREND_CANVAS, ChartKind::Line, chart, false));
    }

    if doc.by_id(BUDGET_CANVAS).is_some() {
        let chart = ChartData {
            labels: data.categories.clone(),
            datasets: vec![
                Dataset {
                    label: Some("Budget".to_string()),
                    data: data.budget_amounts.clone(),
                    background_color: vec!["rgba(102, 126, 234, 0.6)".to_string()],
                    border_color: None,
                },
                Dataset {
                    label: Some("Actual".to_string()),
                    data: data.amounts.clone(),
                    background_color: vec!["rgba(237, 137, 54, 0.6)".to_string()],
                    border_color: None,
                },
            ],
        };
        created.push(registry.register(BUDGET_CANVAS, ChartKind::Bar, chart, true));
    }

    created
}
