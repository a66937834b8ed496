// The two cards on the Form Layouts section.

use uilab::{Locator, Page, Result};

pub struct FormLayoutsPage {
    page: Page,
}

impl FormLayoutsPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Fills the grid form, picks the radio option named `option_text` and
    /// submits.
    pub async fn submit_grid_form_with_credentials_and_option(
        &self,
        email: &str,
        password: &str,
        option_text: &str,
    ) -> Result<()> {
        let card = self.grid_card();
        card.locator("input[placeholder=\"Email\"]").fill(email).await?;
        card.locator("input[placeholder=\"Password\"]")
            .fill(password)
            .await?;
        card.locator(".radio")
            .filter_text(option_text)
            .locator("input")
            .force_check()
            .await?;
        card.locator("button").click().await
    }

    /// Fills the inline form, optionally ticking Remember me, and submits.
    pub async fn submit_inline_form_with_name_email_and_checkbox(
        &self,
        name: &str,
        email: &str,
        remember_me: bool,
    ) -> Result<()> {
        let card = self.inline_card();
        card.locator("input[placeholder=\"Jane Doe\"]").fill(name).await?;
        card.locator("input[placeholder=\"Email\"]").fill(email).await?;
        if remember_me {
            card.locator(".checkbox input").force_check().await?;
        }
        card.locator("button").click().await
    }

    fn grid_card(&self) -> Locator {
        self.page.locator(".card").filter_text("Using the Grid")
    }

    fn inline_card(&self) -> Locator {
        self.page.locator(".card").filter_text("Inline form")
    }
}
