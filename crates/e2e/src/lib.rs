// Page objects for the component playground.
//
// Each page object holds one Page handle and a set of named locators; every
// method is a fixed sequence of fill/check/click calls. Failures propagate,
// nothing recovers.

pub mod datepicker;
pub mod form_layouts;
pub mod manager;
pub mod navigation;

pub use datepicker::DatepickerPage;
pub use form_layouts::FormLayoutsPage;
pub use manager::PageManager;
pub use navigation::NavigationPage;
