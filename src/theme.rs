use crate::charts::ChartRegistry;
use crate::dom::Document;
use crate::storage::Preferences;

pub const DARK_MODE_KEY: &str = "darkMode";
pub const DARK_MODE_CLASS: &str = "dark-mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub legend_label: &'static str,
    pub grid: &'static str,
}

impl Palette {
    pub const fn light() -> Self {
        Self {
            legend_label: "#666",
            grid: "rgba(0,0,0,0.1)",
        }
    }

    pub const fn dark() -> Self {
        Self {
            legend_label: "#fff",
            grid: "rgba(255,255,255,0.1)",
        }
    }

    pub const fn for_mode(dark: bool) -> Self {
        if dark { Self::dark() } else { Self::light() }
    }
}

pub fn dark_mode_preferred(prefs: &Preferences) -> bool {
    prefs.get(DARK_MODE_KEY) == Some("true")
}

/// Page-load half of the theme: honours a stored dark preference.
pub fn apply_stored_theme(doc: &mut Document, charts: &mut ChartRegistry, prefs: &Preferences) -> bool {
    let dark = dark_mode_preferred(prefs);
    if dark {
        let body = doc.body();
        doc.add_class(body, DARK_MODE_CLASS);
        charts.restyle(&Palette::dark());
    }
    dark
}

/// Flips the page theme, records the choice and restyles live charts.
pub fn toggle_dark_mode(doc: &mut Document, charts: &mut ChartRegistry, prefs: &mut Preferences) -> bool {
    let body = doc.body();
    let dark = !doc.has_class(body, DARK_MODE_CLASS);
    if dark {
        doc.add_class(body, DARK_MODE_CLASS);
    } else {
        doc.remove_class(body, DARK_MODE_CLASS);
    }
    prefs.set(DARK_MODE_KEY, dark.to_string());
    charts.restyle(&Palette::for_mode(dark));
    dark
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartData, ChartKind};

    fn one_chart() -> ChartRegistry {
        let mut charts = ChartRegistry::new();
        charts.register(
            "trendChart",
            ChartKind::Line,
            ChartData {
                labels: vec!["Jan".into()],
                datasets: vec![],
            },
            false,
        );
        charts
    }

    #[test]
    fn toggle_round_trips_class_and_preference() {
        let mut doc = Document::new();
        let mut charts = one_chart();
        let mut prefs = Preferences::default();

        assert!(toggle_dark_mode(&mut doc, &mut charts, &mut prefs));
        assert!(doc.has_class(doc.body(), DARK_MODE_CLASS));
        assert_eq!(prefs.get(DARK_MODE_KEY), Some("true"));

        assert!(!toggle_dark_mode(&mut doc, &mut charts, &mut prefs));
        assert!(!doc.has_class(doc.body(), DARK_MODE_CLASS));
        assert_eq!(prefs.get(DARK_MODE_KEY), Some("false"));
        assert_eq!(charts.instances()[0].options.legend_label_color, "#666");
        assert_eq!(charts.instances()[0].revision, 2);
    }

    #[test]
    fn stored_light_preference_leaves_page_alone() {
        let mut doc = Document::new();
        let mut charts = one_chart();
        let mut prefs = Preferences::default();
        prefs.set(DARK_MODE_KEY, "false");

        assert!(!apply_stored_theme(&mut doc, &mut charts, &prefs));
        assert!(!doc.has_class(doc.body(), DARK_MODE_CLASS));
        assert_eq!(charts.instances()[0].revision, 0);
    }
}
