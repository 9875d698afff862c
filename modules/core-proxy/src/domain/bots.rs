//! Display fields derived from bot descriptor names.

use http::StatusCode;
use serde_json::{Map, Value};

use super::error::DomainError;
use super::model::NormalizedResponse;

const GPT_TOKEN: &str = "gpt";
const CHATGPT: &str = "ChatGPT";

/// Uppercase every cased letter that follows anything else, lowercase the
/// others. Uncased scripts count as separators.
///
/// `gpt-3.5` becomes `Gpt-3.5`, `4k` becomes `4K`.
#[must_use]
pub fn titlecase(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_is_letter = false;
    for ch in input.chars() {
        if ch.is_lowercase() || ch.is_uppercase() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Compute `bot_name`, `model_name` and `mode_name` for one bot `name`.
///
/// # Errors
/// Returns `DomainError::MalformedNameField` when `name` has fewer than two
/// `-`-separated segments.
pub fn display_fields(name: &str) -> Result<Map<String, Value>, DomainError> {
    let segments: Vec<&str> = name.split('-').collect();
    let (Some(first), Some(second), Some(last)) =
        (segments.first(), segments.get(1), segments.last())
    else {
        return Err(DomainError::MalformedNameField {
            name: name.to_owned(),
        });
    };

    let mut fields = Map::new();
    if segments.contains(&GPT_TOKEN) {
        fields.insert("bot_name".to_owned(), Value::from(CHATGPT));
    }
    fields.insert(
        "model_name".to_owned(),
        Value::from(titlecase(&format!("{first}-{second}"))),
    );

    let mode_name = match name.to_lowercase().as_str() {
        "gpt-3.5-turbo" => "4K context".to_owned(),
        "gpt-4" => "8K context".to_owned(),
        _ => format!("{} context", titlecase(last)),
    };
    fields.insert("mode_name".to_owned(), Value::from(mode_name));

    Ok(fields)
}

/// Merge display fields into every element of the `result` array.
///
/// Only successful listings are touched. Elements whose `name` cannot be
/// parsed are left as received and logged; order is preserved.
#[must_use]
pub fn enrich_bots(response: NormalizedResponse) -> NormalizedResponse {
    if response.status() != StatusCode::OK {
        return response;
    }
    let (status, mut body) = response.into_parts();

    if let Some(items) = body.get_mut("result").and_then(Value::as_array_mut) {
        for item in items.iter_mut() {
            let Some(descriptor) = item.as_object_mut() else {
                tracing::warn!("bot descriptor is not an object, left unchanged");
                continue;
            };
            let name = descriptor
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| DomainError::MalformedNameField {
                    name: descriptor
                        .get("name")
                        .map_or_else(|| "<missing>".to_owned(), ToString::to_string),
                });
            match name.and_then(display_fields) {
                Ok(fields) => descriptor.extend(fields),
                Err(err) => tracing::warn!(error = %err, "skipping bot enrichment"),
            }
        }
    }

    NormalizedResponse::new(status, body)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(body: Value) -> NormalizedResponse {
        NormalizedResponse::new(StatusCode::OK, body)
    }

    #[test]
    fn titlecase_matches_word_boundaries() {
        assert_eq!(titlecase("gpt-3.5"), "Gpt-3.5");
        assert_eq!(titlecase("claude-instant"), "Claude-Instant");
        assert_eq!(titlecase("LLAMA-2"), "Llama-2");
        assert_eq!(titlecase("32k"), "32K");
        assert_eq!(titlecase(""), "");
    }

    #[test]
    fn uncased_letters_start_a_new_word() {
        assert_eq!(titlecase("\u{4e2d}a"), "\u{4e2d}A");
        assert_eq!(titlecase("\u{4e2d}\u{6587}-bot"), "\u{4e2d}\u{6587}-Bot");
    }

    #[test]
    fn gpt_turbo_gets_4k_context() {
        let out = enrich_bots(listing(json!({ "result": [{ "name": "gpt-3.5-turbo" }] })));
        let bot = &out.body()["result"][0];
        assert_eq!(bot["bot_name"], "ChatGPT");
        assert_eq!(bot["model_name"], "Gpt-3.5");
        assert_eq!(bot["mode_name"], "4K context");
        assert_eq!(bot["name"], "gpt-3.5-turbo");
    }

    #[test]
    fn gpt_4_gets_8k_context() {
        let fields = display_fields("gpt-4").unwrap();
        assert_eq!(fields["bot_name"], "ChatGPT");
        assert_eq!(fields["model_name"], "Gpt-4");
        assert_eq!(fields["mode_name"], "8K context");

        let fields = display_fields("GPT-4").unwrap();
        assert_eq!(fields["mode_name"], "8K context");
        assert!(!fields.contains_key("bot_name"));
    }

    #[test]
    fn non_gpt_bot_has_no_bot_name() {
        let fields = display_fields("claude-instant").unwrap();
        assert!(!fields.contains_key("bot_name"));
        assert_eq!(fields["model_name"], "Claude-Instant");
        assert_eq!(fields["mode_name"], "Instant context");
    }

    #[test]
    fn single_segment_name_is_malformed() {
        let err = display_fields("davinci").unwrap_err();
        assert!(matches!(err, DomainError::MalformedNameField { name } if name == "davinci"));
    }

    #[test]
    fn derived_fields_overwrite_existing_ones() {
        let out = enrich_bots(listing(json!({
            "result": [{ "name": "gpt-4", "mode_name": "stale", "id": 3 }]
        })));
        let bot = &out.body()["result"][0];
        assert_eq!(bot["mode_name"], "8K context");
        assert_eq!(bot["id"], 3);
    }

    #[test]
    fn malformed_elements_are_skipped_and_order_kept() {
        let out = enrich_bots(listing(json!({
            "result": [
                { "name": "claude-instant" },
                { "name": "davinci" },
                { "name": 7 },
                { "name": "gpt-4" }
            ],
            "count": 4
        })));
        let result = out.body()["result"].as_array().unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result[0]["model_name"], "Claude-Instant");
        assert_eq!(result[1], json!({ "name": "davinci" }));
        assert_eq!(result[2], json!({ "name": 7 }));
        assert_eq!(result[3]["model_name"], "Gpt-4");
        assert_eq!(out.body()["count"], 4);
    }

    #[test]
    fn non_ok_listing_is_untouched() {
        let resp = NormalizedResponse::new(
            StatusCode::UNAUTHORIZED,
            json!({ "result": [{ "name": "gpt-4" }] }),
        );
        let out = enrich_bots(resp.clone());
        assert_eq!(out, resp);
    }

    #[test]
    fn listing_without_result_array_is_untouched() {
        let resp = listing(json!({ "status": "OK" }));
        assert_eq!(enrich_bots(resp.clone()), resp);
    }
}
