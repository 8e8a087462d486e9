use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::config::PictureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Default,
    Halloween,
    Christmas,
}

impl Season {
    /// October is Halloween; December up to and including the 24th is
    /// Christmas.
    pub fn for_date(date: NaiveDate) -> Self {
        match date.month() {
            10 => Season::Halloween,
            12 if date.day() <= 24 => Season::Christmas,
            _ => Season::Default,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Season::Default => "default",
            Season::Halloween => "halloween",
            Season::Christmas => "christmas",
        }
    }
}

/// Profile picture variants as exposed to the page shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureView {
    pub season: Season,
    pub selected: String,
    pub default: String,
    pub halloween: String,
    pub christmas: String,
}

impl PictureView {
    pub fn new(pictures: &PictureConfig, season: Season) -> Self {
        let or_default = |p: &Option<String>| p.clone().unwrap_or_else(|| pictures.default.clone());
        let halloween = or_default(&pictures.halloween);
        let christmas = or_default(&pictures.christmas);
        let selected = match season {
            Season::Default => pictures.default.clone(),
            Season::Halloween => halloween.clone(),
            Season::Christmas => christmas.clone(),
        };

        Self {
            season,
            selected,
            default: pictures.default.clone(),
            halloween,
            christmas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn seasons_by_month() {
        assert_eq!(Season::for_date(day(10, 1)), Season::Halloween);
        assert_eq!(Season::for_date(day(10, 31)), Season::Halloween);
        assert_eq!(Season::for_date(day(12, 1)), Season::Christmas);
        assert_eq!(Season::for_date(day(12, 24)), Season::Christmas);
        assert_eq!(Season::for_date(day(12, 25)), Season::Default);
        assert_eq!(Season::for_date(day(7, 4)), Season::Default);
    }

    #[test]
    fn missing_variants_fall_back_to_default_picture() {
        let pictures = PictureConfig {
            default: "/me.jpg".into(),
            halloween: Some("/me-spooky.jpg".into()),
            christmas: None,
        };

        let halloween = PictureView::new(&pictures, Season::Halloween);
        assert_eq!(halloween.selected, "/me-spooky.jpg");

        let christmas = PictureView::new(&pictures, Season::Christmas);
        assert_eq!(christmas.selected, "/me.jpg");
        assert_eq!(christmas.christmas, "/me.jpg");
    }
}
