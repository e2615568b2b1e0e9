//! Settings schema - 生の JSON を検証して問題を全て集める

use serde_json::{Map, Value};

use super::ConfigIssue;

const REQUIRED_STRINGS: [&str; 7] = [
    "client",
    "secret",
    "user_agent",
    "username",
    "password",
    "twitch_client_id",
    "twitch_client_secret",
];

/// Checks `value` against the settings layout. Empty means valid.
pub fn validate(value: &Value) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let Some(root) = value.as_object() else {
        issues.push(ConfigIssue::new("$", "expected an object"));
        return issues;
    };

    for key in REQUIRED_STRINGS {
        require(&mut issues, root, "", key, expect_string);
    }
    require(&mut issues, root, "", "delay", expect_positive_integer);

    match root.get("subreddits") {
        None => issues.push(ConfigIssue::new("subreddits", "required key not found")),
        Some(Value::Array(subreddits)) => {
            for (i, subreddit) in subreddits.iter().enumerate() {
                validate_subreddit(&mut issues, &format!("subreddits[{i}]"), subreddit);
            }
        }
        Some(other) => issues.push(ConfigIssue::new(
            "subreddits",
            format!("expected a list, got {}", type_name(other)),
        )),
    }

    issues
}

fn validate_subreddit(issues: &mut Vec<ConfigIssue>, path: &str, value: &Value) {
    let Some(sub) = value.as_object() else {
        issues.push(ConfigIssue::new(path, "expected an object"));
        return;
    };

    require(issues, sub, path, "name", expect_string);
    require(issues, sub, path, "format", expect_template_map);
    require(issues, sub, path, "top_cut", expect_positive_integer);
    require(issues, sub, path, "wiki", expect_string);

    optional(issues, sub, path, "maximum", expect_count);
    optional(issues, sub, path, "maximum_record", expect_string);
    optional(issues, sub, path, "minimum", expect_count);
    optional(issues, sub, path, "minimum_record", expect_string);
    optional(issues, sub, path, "track_minimum", expect_bool);
    optional(issues, sub, path, "game_ids", expect_string_map);
    optional(issues, sub, path, "widget", expect_widget);
}

type Check = fn(&Value) -> Result<(), String>;

fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn require(
    issues: &mut Vec<ConfigIssue>,
    object: &Map<String, Value>,
    parent: &str,
    key: &str,
    check: Check,
) {
    match object.get(key) {
        None => issues.push(ConfigIssue::new(
            field_path(parent, key),
            "required key not found",
        )),
        Some(value) => {
            if let Err(problem) = check(value) {
                issues.push(ConfigIssue::new(field_path(parent, key), problem));
            }
        }
    }
}

/// Absent and `null` are both accepted.
fn optional(
    issues: &mut Vec<ConfigIssue>,
    object: &Map<String, Value>,
    parent: &str,
    key: &str,
    check: Check,
) {
    if let Some(value) = object.get(key).filter(|v| !v.is_null()) {
        if let Err(problem) = check(value) {
            issues.push(ConfigIssue::new(field_path(parent, key), problem));
        }
    }
}

fn expect_string(value: &Value) -> Result<(), String> {
    match value {
        Value::String(_) => Ok(()),
        other => Err(format!("expected a string, got {}", type_name(other))),
    }
}

fn expect_bool(value: &Value) -> Result<(), String> {
    match value {
        Value::Bool(_) => Ok(()),
        other => Err(format!("expected true or false, got {}", type_name(other))),
    }
}

fn expect_count(value: &Value) -> Result<(), String> {
    match value.as_u64() {
        Some(_) => Ok(()),
        None => Err(format!(
            "expected a non-negative integer, got {}",
            type_name(value)
        )),
    }
}

fn expect_positive_integer(value: &Value) -> Result<(), String> {
    match value.as_u64() {
        Some(0) => Err("must be greater than zero".to_string()),
        Some(_) => Ok(()),
        None => Err(format!(
            "expected a positive integer, got {}",
            type_name(value)
        )),
    }
}

/// Game name -> template; `null` templates mean "default".
fn expect_template_map(value: &Value) -> Result<(), String> {
    let Some(map) = value.as_object() else {
        return Err(format!("expected an object, got {}", type_name(value)));
    };
    match map.iter().find(|(_, v)| !(v.is_string() || v.is_null())) {
        Some((game, v)) => Err(format!(
            "template for {game:?} must be a string or null, got {}",
            type_name(v)
        )),
        None => Ok(()),
    }
}

fn expect_string_map(value: &Value) -> Result<(), String> {
    let Some(map) = value.as_object() else {
        return Err(format!("expected an object, got {}", type_name(value)));
    };
    match map.iter().find(|(_, v)| !v.is_string()) {
        Some((key, v)) => Err(format!(
            "value for {key:?} must be a string, got {}",
            type_name(v)
        )),
        None => Ok(()),
    }
}

fn expect_widget(value: &Value) -> Result<(), String> {
    let Some(widget) = value.as_object() else {
        return Err(format!("expected an object, got {}", type_name(value)));
    };
    let mut problems = Vec::new();
    for (key, check) in [("name", expect_string as Check), ("table", expect_bool as Check)] {
        match widget.get(key) {
            None => problems.push(format!("{key}: required key not found")),
            Some(v) => {
                if let Err(problem) = check(v) {
                    problems.push(format!("{key}: {problem}"));
                }
            }
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join(", "))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_u64() || n.is_i64() => "an integer",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "client": "c", "secret": "s", "user_agent": "ua", "username": "u",
            "password": "p", "twitch_client_id": "ti", "twitch_client_secret": "ts",
            "delay": 60,
            "subreddits": [
                {"name": "a", "format": {"Chess": null}, "top_cut": 5, "wiki": "w"},
                {"name": "b", "format": {}, "top_cut": 1, "wiki": "w",
                 "maximum": null, "track_minimum": true, "game_ids": {"1": "Chess"}}
            ]
        })
    }

    #[test]
    fn accepts_valid_settings() {
        assert_eq!(validate(&valid()), vec![]);
    }

    #[test]
    fn rejects_non_object_root() {
        let issues = validate(&json!([1, 2]));
        assert_eq!(issues, vec![ConfigIssue::new("$", "expected an object")]);
    }

    #[test]
    fn missing_everything_is_reported_at_once() {
        let issues = validate(&json!({}));
        assert_eq!(issues.len(), 9);
        assert!(issues.iter().all(|i| i.problem == "required key not found"));
        assert_eq!(issues[7].path, "delay");
        assert_eq!(issues[8].path, "subreddits");
    }

    #[rstest]
    #[case::zero_top_cut("top_cut", json!(0), "must be greater than zero")]
    #[case::negative_top_cut("top_cut", json!(-3), "expected a positive integer, got an integer")]
    #[case::string_top_cut("top_cut", json!("10"), "expected a positive integer, got a string")]
    #[case::list_format("format", json!(["Chess"]), "expected an object, got a list")]
    #[case::numeric_template("format", json!({"Chess": 1}), "template for \"Chess\" must be a string or null, got an integer")]
    #[case::float_maximum("maximum", json!(1.5), "expected a non-negative integer, got a number")]
    #[case::numeric_wiki("wiki", json!(7), "expected a string, got an integer")]
    #[case::string_flag("track_minimum", json!("yes"), "expected true or false, got a string")]
    #[case::bad_game_ids("game_ids", json!({"1": 2}), "value for \"1\" must be a string, got an integer")]
    #[case::widget_without_table("widget", json!({"name": "Live"}), "table: required key not found")]
    #[case::widget_bad_name("widget", json!({"name": 3, "table": false}), "name: expected a string, got an integer")]
    fn subreddit_field_problems(#[case] key: &str, #[case] bad: Value, #[case] problem: &str) {
        let mut value = valid();
        value["subreddits"][1][key] = bad;

        let issues = validate(&value);
        assert_eq!(
            issues,
            vec![ConfigIssue::new(format!("subreddits[1].{key}"), problem)]
        );
    }

    #[test]
    fn accepts_widget_and_unknown_keys() {
        let mut value = valid();
        value["subreddits"][0]["widget"] = json!({"name": "Live now", "table": true});
        value["subreddits"][0]["flair"] = json!("live");
        value["owner"] = json!("mods");
        assert_eq!(validate(&value), vec![]);
    }

    #[test]
    fn subreddit_must_be_object() {
        let mut value = valid();
        value["subreddits"] = json!(["chess"]);
        assert_eq!(
            validate(&value),
            vec![ConfigIssue::new("subreddits[0]", "expected an object")]
        );
    }
}
