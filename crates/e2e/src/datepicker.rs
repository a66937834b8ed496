// Single and ranged calendar selection.
//
// Offsets count forward from today; the calendar is paged ahead with the
// right chevron until the target month is shown.

use chrono::{Datelike, Duration, Local, NaiveDate};
use uilab::{Locator, Page, Result, expect};

pub struct DatepickerPage {
    page: Page,
}

impl DatepickerPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Picks `days_from_today` ahead in the common datepicker and asserts
    /// the input took the formatted date. Returns the asserted value.
    pub async fn select_common_datepicker_date_from_today(
        &self,
        days_from_today: u32,
    ) -> Result<String> {
        let card = self.page.locator(".single-picker-card");
        let input = card.locator("input[placeholder=\"Form Picker\"]");
        input.click().await?;
        let expected = self.pick_day(&card, days_from_today).await?;
        expect(input).to_have_value(&expected).await?;
        Ok(expected)
    }

    /// Picks a start and end day ahead of today in the range datepicker and
    /// asserts the combined value. Returns the asserted value.
    pub async fn select_datepicker_with_range_from_today(
        &self,
        start_from_today: u32,
        end_from_today: u32,
    ) -> Result<String> {
        let card = self.page.locator(".range-picker-card");
        let input = card.locator("input[placeholder=\"Range Picker\"]");
        input.click().await?;
        let start = self.pick_day(&card, start_from_today).await?;
        let end = self.pick_day(&card, end_from_today).await?;
        let expected = format!("{start} - {end}");
        expect(input).to_have_value(&expected).await?;
        Ok(expected)
    }

    /// Navigates the open calendar to the month holding today + `offset`
    /// days, clicks that day cell and returns the value the input should
    /// then carry ("MMM D, YYYY").
    async fn pick_day(&self, card: &Locator, offset: u32) -> Result<String> {
        let date = target_date(offset);
        let wanted_title = date.format("%B %Y").to_string();
        let title = card.locator(".calendar-title");
        let mut shown = title.inner_text().await?;
        while !shown.contains(&wanted_title) {
            card.locator(".chevron-right").click().await?;
            shown = title.inner_text().await?;
        }
        // Exact match keeps day 1 from colliding with 10..19.
        card.locator(".day-cell:not(.bounding-month)")
            .filter_text_exact(date.day().to_string())
            .click()
            .await?;
        Ok(format_picked(date))
    }
}

fn target_date(offset: u32) -> NaiveDate {
    Local::now().date_naive() + Duration::days(i64::from(offset))
}

fn format_picked(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picked_format_has_no_zero_padding() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).expect("valid date");
        assert_eq!(format_picked(date), "Mar 5, 2026");
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).expect("valid date");
        assert_eq!(format_picked(date), "Dec 25, 2026");
    }

    #[test]
    fn target_date_moves_forward() {
        assert_eq!(target_date(0), Local::now().date_naive());
        assert!(target_date(10) > target_date(0));
    }
}
