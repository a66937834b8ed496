// Sidebar navigation across the playground sections.

use uilab::{Page, Result};

pub struct NavigationPage {
    page: Page,
}

impl NavigationPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub async fn form_layouts_page(&self) -> Result<()> {
        self.expand_group("Forms").await?;
        self.menu_item("Form Layouts").await
    }

    pub async fn datepicker_page(&self) -> Result<()> {
        self.expand_group("Forms").await?;
        self.menu_item("Datepicker").await
    }

    pub async fn toastr_page(&self) -> Result<()> {
        self.expand_group("Modal & Overlays").await?;
        self.menu_item("Toastr").await
    }

    pub async fn tooltip_page(&self) -> Result<()> {
        self.expand_group("Modal & Overlays").await?;
        self.menu_item("Tooltip").await
    }

    pub async fn smart_table_page(&self) -> Result<()> {
        self.expand_group("Tables & Data").await?;
        self.menu_item("Smart Table").await
    }

    pub async fn dashboard_page(&self) -> Result<()> {
        self.menu_item("Dashboard").await
    }

    /// Expands a menu group only when it is collapsed, so re-navigation
    /// never folds an open group shut.
    async fn expand_group(&self, title: &str) -> Result<()> {
        let group = self.page.get_by_title(title);
        if group.get_attribute("aria-expanded").await?.as_deref() == Some("false") {
            group.click().await?;
        }
        Ok(())
    }

    async fn menu_item(&self, title: &str) -> Result<()> {
        self.page
            .locator(".menu-item")
            .filter_text_exact(title)
            .click()
            .await
    }
}
