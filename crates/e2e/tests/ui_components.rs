// Component interactions driven through the harness directly: inputs,
// radios, checkboxes, the theme dropdown, tooltips, dialogs, the smart
// table, datepickers, the slider and drag-and-drop.

mod support;

use std::time::Duration;

use chrono::{Datelike, Duration as ChronoDuration, Local};
use support::Lab;
use uilab::expect;

#[tokio::test]
async fn input_fields_fill_clear_and_type() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Forms").click().await.expect("Failed to open Forms");
    page.get_by_title("Form Layouts")
        .click()
        .await
        .expect("Failed to open Form Layouts");

    let email = page.locator(".grid-form-card input[placeholder=\"Email\"]");
    email.fill("test@test.com").await.expect("Failed to fill");
    email.clear().await.expect("Failed to clear");
    email
        .press_sequentially("test2@test.com", Duration::from_millis(50))
        .await
        .expect("Failed to type");

    // Generic assertion on the extracted value, then the retrying kind.
    let value = email.input_value().await.expect("Failed to read value");
    assert_eq!(value, "test2@test.com");
    expect(email)
        .to_have_value("test2@test.com")
        .await
        .expect("Value assertion failed");

    lab.finish().await;
}

#[tokio::test]
async fn radio_buttons_select_exclusively() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Forms").click().await.expect("Failed to open Forms");
    page.get_by_title("Form Layouts")
        .click()
        .await
        .expect("Failed to open Form Layouts");

    let card = page.locator(".card").filter_text("Using the Grid");
    let option_one = card.locator(".radio").filter_text("Option 1").locator("input");
    let option_two = card.locator(".radio").filter_text("Option 2").locator("input");

    option_one.force_check().await.expect("Failed to check Option 1");
    assert!(option_one.is_checked().await.expect("Failed to read state"));
    expect(option_one.clone())
        .to_be_checked()
        .await
        .expect("Option 1 should be checked");

    option_two.force_check().await.expect("Failed to check Option 2");
    expect(option_one)
        .not()
        .to_be_checked()
        .await
        .expect("Option 1 should have been deselected");
    expect(option_two)
        .to_be_checked()
        .await
        .expect("Option 2 should be checked");

    lab.finish().await;
}

#[tokio::test]
async fn checkboxes_force_toggle_and_loop() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Modal & Overlays")
        .click()
        .await
        .expect("Failed to open Modal & Overlays");
    page.get_by_title("Toastr").click().await.expect("Failed to open Toastr");

    let hide_on_click = page
        .locator("#toastr .checkbox")
        .filter_text("Hide on click")
        .locator("input");
    let prevent_duplicates = page
        .locator("#toastr .checkbox")
        .filter_text("Prevent arising of duplicate toast")
        .locator("input");

    hide_on_click.force_uncheck().await.expect("Failed to uncheck");
    prevent_duplicates.force_check().await.expect("Failed to check");
    expect(hide_on_click).not().to_be_checked().await.expect("Should be off");
    expect(prevent_duplicates).to_be_checked().await.expect("Should be on");

    let boxes = page
        .locator("#toastr .checkbox input")
        .all()
        .await
        .expect("Failed to enumerate checkboxes");
    assert_eq!(boxes.len(), 3);
    for checkbox in boxes {
        checkbox.force_uncheck().await.expect("Failed to uncheck");
        assert!(!checkbox.is_checked().await.expect("Failed to read state"));
    }

    lab.finish().await;
}

#[tokio::test]
async fn theme_dropdown_changes_header_color() {
    let lab = Lab::start().await;
    let page = lab.playground().await;

    let options = page.locator(".theme-options .theme-option");
    page.locator(".theme-select").click().await.expect("Failed to open dropdown");
    expect(options.clone())
        .to_have_count(3)
        .await
        .expect("Dropdown should list three themes");
    page.locator(".theme-select").click().await.expect("Failed to close dropdown");

    let themes = [
        ("Light", "rgb(255, 255, 255)"),
        ("Dark", "rgb(34, 43, 69)"),
        ("Cosmic", "rgb(50, 50, 90)"),
    ];
    for (name, color) in themes {
        page.locator(".theme-select").click().await.expect("Failed to open dropdown");
        options
            .filter_text_exact(name)
            .click()
            .await
            .expect("Failed to pick theme");
        let background = page
            .locator("header.app-header")
            .css_value("background-color")
            .await
            .expect("Failed to read background");
        assert_eq!(background, color, "theme {name}");
    }

    lab.finish().await;
}

#[tokio::test]
async fn tooltip_appears_on_hover() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Modal & Overlays")
        .click()
        .await
        .expect("Failed to open Modal & Overlays");
    page.get_by_title("Tooltip").click().await.expect("Failed to open Tooltip");

    let card = page.locator(".card").filter_text("Tooltip Placements");
    card.locator("button")
        .filter_text_exact("Top")
        .hover()
        .await
        .expect("Failed to hover");

    let text = page
        .locator(".tooltip")
        .inner_text()
        .await
        .expect("Tooltip never appeared");
    assert_eq!(text, "This is a tooltip");

    lab.finish().await;
}

#[tokio::test]
async fn confirm_dialog_guards_row_deletion() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Tables & Data")
        .click()
        .await
        .expect("Failed to open Tables & Data");
    page.get_by_title("Smart Table").click().await.expect("Failed to open Smart Table");

    let dialogs = page.watch_dialogs(true).await.expect("Failed to watch dialogs");
    page.locator(".smart-table tbody tr")
        .filter_text("iris.vogel@example.com")
        .locator(".trash")
        .click()
        .await
        .expect("Failed to click trash");

    let message = dialogs
        .wait_for_message(Duration::from_secs(5))
        .await
        .expect("No dialog observed");
    assert_eq!(message, "Are you sure you want to delete?");

    expect(
        page.locator(".smart-table tbody tr")
            .filter_text("iris.vogel@example.com"),
    )
    .to_have_count(0)
    .await
    .expect("Deleted row is still present");

    lab.finish().await;
}

#[tokio::test]
async fn smart_table_edit_by_row_text_and_position() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Tables & Data")
        .click()
        .await
        .expect("Failed to open Tables & Data");
    page.get_by_title("Smart Table").click().await.expect("Failed to open Smart Table");

    // Locate the row by its text and rewrite the age.
    let felix = page
        .locator(".smart-table tbody tr")
        .filter_text("felix.hale@example.com");
    felix.locator(".edit").click().await.expect("Failed to enter edit mode");
    let age_editor = page.locator("input.input-editor[placeholder=\"Age\"]");
    age_editor.clear().await.expect("Failed to clear editor");
    age_editor.fill("39").await.expect("Failed to fill editor");
    page.locator(".smart-table .confirm").click().await.expect("Failed to confirm");
    expect(felix.locator("td").last())
        .to_have_text("39")
        .await
        .expect("Age was not updated");

    // Second page, row picked by position.
    page.locator("ul.pager a")
        .filter_text_exact("2")
        .click()
        .await
        .expect("Failed to page");
    let first_row = page.locator(".smart-table tbody tr").first();
    first_row.locator(".edit").click().await.expect("Failed to enter edit mode");
    let email_editor = page.locator("input.input-editor[placeholder=\"E-mail\"]");
    email_editor.clear().await.expect("Failed to clear editor");
    email_editor.fill("delia.holt@lab.dev").await.expect("Failed to fill editor");
    page.locator(".smart-table .confirm").click().await.expect("Failed to confirm");
    expect(page.locator(".smart-table tbody tr").first())
        .to_contain_text("delia.holt@lab.dev")
        .await
        .expect("E-mail was not updated");

    lab.finish().await;
}

#[tokio::test]
async fn age_filter_narrows_to_matching_rows() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Tables & Data")
        .click()
        .await
        .expect("Failed to open Tables & Data");
    page.get_by_title("Smart Table").click().await.expect("Failed to open Smart Table");

    let age_filter = page.locator("input.filter[placeholder=\"Age\"]");
    for age in ["20", "30", "40"] {
        age_filter.clear().await.expect("Failed to clear filter");
        age_filter.fill(age).await.expect("Failed to fill filter");
        expect(page.locator(".smart-table tbody tr"))
            .to_have_count(2)
            .await
            .expect("Two rows carry each sampled age");
        let rows = page
            .locator(".smart-table tbody tr")
            .all()
            .await
            .expect("Failed to enumerate rows");
        for row in rows {
            let cell = row.locator("td").last().inner_text().await.expect("Failed to read age");
            assert_eq!(cell, age);
        }
    }

    age_filter.clear().await.expect("Failed to clear filter");
    expect(page.locator(".smart-table tbody tr"))
        .to_have_count(10)
        .await
        .expect("Cleared filter should show the first page again");

    lab.finish().await;
}

#[tokio::test]
async fn datepicker_selects_a_date_one_week_out() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Forms").click().await.expect("Failed to open Forms");
    page.get_by_title("Datepicker").click().await.expect("Failed to open Datepicker");

    let input = page.locator(".single-picker-card input[placeholder=\"Form Picker\"]");
    input.click().await.expect("Failed to open the calendar");

    let date = Local::now().date_naive() + ChronoDuration::days(7);
    let wanted_title = date.format("%B %Y").to_string();
    let title = page.locator(".single-picker-card .calendar-title");
    let mut shown = title.inner_text().await.expect("Failed to read title");
    while !shown.contains(&wanted_title) {
        page.locator(".single-picker-card .chevron-right")
            .click()
            .await
            .expect("Failed to page the calendar");
        shown = title.inner_text().await.expect("Failed to read title");
    }
    page.locator(".single-picker-card .day-cell:not(.bounding-month)")
        .filter_text_exact(date.day().to_string())
        .click()
        .await
        .expect("Failed to click the day");

    expect(input)
        .to_have_value(&date.format("%b %-d, %Y").to_string())
        .await
        .expect("Picked date did not land in the input");

    lab.finish().await;
}

#[tokio::test]
async fn slider_drag_reaches_the_maximum() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Dashboard").click().await.expect("Failed to open Dashboard");

    expect(page.locator(".temp-value"))
        .to_have_text("12\u{b0}")
        .await
        .expect("Slider should start at the minimum");

    // Overshooting the track clamps the knob at the right edge.
    page.locator(".temp-knob")
        .drag_by(260.0, 0.0)
        .await
        .expect("Failed to drag the knob");

    expect(page.locator(".temp-value"))
        .to_have_text("30\u{b0}")
        .await
        .expect("Slider did not reach the maximum");

    lab.finish().await;
}

#[tokio::test]
async fn card_drags_between_board_columns() {
    let lab = Lab::start().await;
    let page = lab.playground().await;
    page.get_by_title("Dashboard").click().await.expect("Failed to open Dashboard");

    let card = page.locator(".task-card").filter_text("Write tests");
    let done = page.locator(".column[data-column=\"done\"]");
    card.drag_to(&done).await.expect("Failed to drag the card");

    expect(
        page.locator(".column[data-column=\"done\"] .task-card")
            .filter_text("Write tests"),
    )
    .to_have_count(1)
    .await
    .expect("Card did not land in Done");
    expect(
        page.locator(".column[data-column=\"todo\"] .task-card")
            .filter_text("Write tests"),
    )
    .to_have_count(0)
    .await
    .expect("Card is still in To Do");

    lab.finish().await;
}
