use maud::{DOCTYPE, PreEscaped, html};

use crate::error::ServiceError;

const ERROR_PAGE_CSS: &str = r#"
    body { font-family: Arial, sans-serif; margin: 0; background: #f4f4f4; color: #222; }
    section { width: min(760px, 92vw); margin: 48px auto; }
    .card { background: #fff; border-radius: 8px; padding: 24px; box-shadow: 0 4px 24px rgba(0, 0, 0, 0.08); }
    code { background: #f0f0f0; padding: 2px 6px; border-radius: 4px; }
"#;

pub fn image_tag(url: &str, size: u32) -> String {
    html! {
        img src=(url) width=(size) height=(size) alt="";
    }
    .into_string()
}

pub fn error_page(error: &ServiceError) -> String {
    let status = error.status_code();
    let (message, detail) = match error {
        ServiceError::Validation(reason) => ("Bad Request", reason.as_str()),
        ServiceError::Configuration(_) => (
            "Misconfigured",
            "The Gravatar service is not configured correctly.",
        ),
        ServiceError::CacheUnavailable(_) => ("Service Unavailable", "Please retry later."),
        ServiceError::Upstream => ("Bad Gateway", "Gravatar could not be reached."),
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Gravatar" }
                style { (PreEscaped(ERROR_PAGE_CSS)) }
            }
            body {
                section {
                    div.card {
                        h1 { (status) " - " (message) }
                        p { (detail) }
                        p { "URL example: " code { "/url?email=EMAIL&size=80" } }
                    }
                }
            }
        }
    }
    .into_string()
}
