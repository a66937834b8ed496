// Lazily constructs the page objects and hands the same instance back on
// every later access.

use std::cell::OnceCell;

use uilab::Page;

use crate::datepicker::DatepickerPage;
use crate::form_layouts::FormLayoutsPage;
use crate::navigation::NavigationPage;

pub struct PageManager {
    page: Page,
    navigation: OnceCell<NavigationPage>,
    form_layouts: OnceCell<FormLayoutsPage>,
    datepicker: OnceCell<DatepickerPage>,
}

impl PageManager {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            navigation: OnceCell::new(),
            form_layouts: OnceCell::new(),
            datepicker: OnceCell::new(),
        }
    }

    pub fn navigate_to(&self) -> &NavigationPage {
        self.navigation
            .get_or_init(|| NavigationPage::new(self.page.clone()))
    }

    pub fn on_form_layouts_page(&self) -> &FormLayoutsPage {
        self.form_layouts
            .get_or_init(|| FormLayoutsPage::new(self.page.clone()))
    }

    pub fn on_datepicker_page(&self) -> &DatepickerPage {
        self.datepicker
            .get_or_init(|| DatepickerPage::new(self.page.clone()))
    }
}
