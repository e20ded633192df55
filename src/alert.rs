//! Alert system for displaying success and error messages to users.
//!
//! Alerts are returned as HTML fragments that htmx swaps into the
//! `#alert-container` element of the base page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    Success,
    Error,
}

/// A dismissable message with optional details.
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub alert_type: AlertType,
    pub message: &'a str,
    pub details: &'a str,
}

impl<'a> Alert<'a> {
    /// Create a new success alert
    pub fn success(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message,
            details,
        }
    }

    /// Create a new error alert
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message,
            details,
        }
    }

    pub fn into_html(self) -> Markup {
        let style = match self.alert_type {
            AlertType::Success => {
                "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
                dark:bg-gray-800 dark:text-green-400"
            }
            AlertType::Error => {
                "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
                dark:bg-gray-800 dark:text-red-400"
            }
        };

        let type_name = match self.alert_type {
            AlertType::Success => "success",
            AlertType::Error => "error",
        };

        html! {
            div class=(style) role="alert" data-alert-type=(type_name)
            {
                div class="flex justify-between items-start gap-4"
                {
                    div
                    {
                        span class="font-medium" { (self.message) }

                        @if !self.details.is_empty() {
                            p { (self.details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Close"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }

    /// Wrap the alert so htmx swaps it into the alert container regardless of
    /// the request's target.
    pub fn into_oob_html(self) -> Markup {
        html! {
            div id="alert-container" hx-swap-oob="innerHTML" { (self.into_html()) }
        }
    }

    /// Render the alert as a response with `status_code`.
    pub fn into_response(self, status_code: StatusCode) -> Response {
        (status_code, Html(self.into_html().into_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_shows_message_and_details() {
        let markup = Alert::error("Could not save", "Try again later.").into_html();
        let fragment = Html::parse_fragment(&markup.into_string());

        let alert = fragment
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("no alert rendered");
        assert_eq!(alert.value().attr("data-alert-type"), Some("error"));
        let text = alert.text().collect::<String>();
        assert!(text.contains("Could not save"));
        assert!(text.contains("Try again later."));
    }

    #[test]
    fn success_alert_omits_empty_details() {
        let markup = Alert::success("Saved", "").into_html();
        let fragment = Html::parse_fragment(&markup.into_string());

        let paragraphs = fragment.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(paragraphs, 0);
    }

    #[test]
    fn response_uses_given_status() {
        let response = Alert::error("Nope", "").into_response(StatusCode::CONFLICT);

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
