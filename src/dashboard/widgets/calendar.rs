use super::{Widget, WidgetSeed};
use crate::dashboard::dashboard::DashboardContext;
use chrono::{Datelike, NaiveDate};
use eframe::egui;

pub struct CalendarWidget {
    id: String,
    selected_date: Option<NaiveDate>,
    view_month: Option<NaiveDate>,
}

impl CalendarWidget {
    pub fn new(seed: &WidgetSeed<'_>) -> Self {
        Self {
            id: seed.id.to_string(),
            selected_date: None,
            view_month: None,
        }
    }

    fn ensure_selection(&mut self, today: NaiveDate) {
        if self.selected_date.is_none() {
            self.selected_date = Some(today);
        }
        if self.view_month.is_none() {
            self.view_month = Some(first_of_month(today));
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month <= 0 {
        month += 12;
        year -= 1;
    }
    NaiveDate::from_ymd_opt(year, month as u32, 1).unwrap_or(date)
}

pub fn days_in_month(month: NaiveDate) -> u32 {
    let next = add_months(first_of_month(month), 1);
    next.pred_opt().map(|d| d.day()).unwrap_or(31)
}

impl Widget for CalendarWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) {
        let today = ctx.now.date_naive();
        self.ensure_selection(today);
        let (Some(view_month), Some(selected)) = (self.view_month, self.selected_date) else {
            return;
        };
        ui.horizontal(|ui| {
            if ui.button("<").clicked() {
                self.view_month = Some(add_months(view_month, -1));
            }
            ui.label(egui::RichText::new(view_month.format("%B %Y").to_string()).strong());
            if ui.button(">").clicked() {
                self.view_month = Some(add_months(view_month, 1));
            }
        });
        ui.separator();
        let grid_id = ("calendar_month_grid", self.id.as_str());
        if let Some(date) = month_grid(ui, grid_id, view_month, selected, today) {
            self.selected_date = Some(date);
        }
        ui.label(selected.format("%A, %B %-d, %Y").to_string());
    }
}

fn month_grid(
    ui: &mut egui::Ui,
    id: impl std::hash::Hash,
    month: NaiveDate,
    selected_date: NaiveDate,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let first_weekday = month.weekday().num_days_from_sunday() as i32;
    let days = days_in_month(month) as i32;
    let mut picked = None;
    egui::Grid::new(id)
        .num_columns(7)
        .spacing([4.0, 4.0])
        .show(ui, |ui| {
            for weekday in ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"] {
                ui.label(egui::RichText::new(weekday).weak());
            }
            ui.end_row();

            let mut day = 1;
            for i in 0..42 {
                if i % 7 == 0 && i != 0 {
                    ui.end_row();
                }
                if i < first_weekday || day > days {
                    ui.label(" ");
                    continue;
                }
                let date = NaiveDate::from_ymd_opt(month.year(), month.month(), day as u32)
                    .unwrap_or(month);
                let mut text = egui::RichText::new(day.to_string());
                if date == today {
                    text = text.strong().underline();
                }
                if ui.selectable_label(date == selected_date, text).clicked() {
                    picked = Some(date);
                }
                day += 1;
            }
        });
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_navigation_wraps_years() {
        assert_eq!(add_months(date(2024, 1, 15), -1), date(2023, 12, 1));
        assert_eq!(add_months(date(2024, 12, 1), 1), date(2025, 1, 1));
    }

    #[test]
    fn knows_month_lengths() {
        assert_eq!(days_in_month(date(2024, 2, 1)), 29);
        assert_eq!(days_in_month(date(2023, 2, 1)), 28);
        assert_eq!(days_in_month(date(2024, 12, 1)), 31);
    }
}
