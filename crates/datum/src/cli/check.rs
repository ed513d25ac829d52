use std::path::Path;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use datum_core::OutputMode;
use datum_registry::DataPackage;
use serde_json::json;

use crate::ctx::Ctx;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct CheckArg {
    /// Path to the datapackage.json to validate
    #[arg(default_value = "datapackage.json")]
    pub file: PathBuf,
}

/// Exit codes: 0 valid, 1 schema violations, 2 missing file or invalid
/// JSON.
pub fn cmd_check(ctx: &Ctx, arg: &CheckArg) -> Result<i32> {
    let file = &arg.file;

    if !file.exists() {
        let errors = vec![(
            "file".to_string(),
            format!("File not found: {}", file.display()),
        )];
        if ctx.output == OutputMode::Json {
            emit_json(false, file, &errors);
        } else {
            output::error_line(&format!(
                "File not found: {}\n\nRun {} to create a datapackage.json, \
                 or pass a path: {}",
                output::bold(&file.display().to_string()),
                output::bold("datum init"),
                output::bold("datum check path/to/datapackage.json"),
            ));
        }
        return Ok(2);
    }

    let raw = std::fs::read_to_string(file)?;
    let value: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            if ctx.output == OutputMode::Json {
                let errors = vec![("json".to_string(), format!("Invalid JSON: {err}"))];
                emit_json(false, file, &errors);
            } else {
                output::error_line(&format!(
                    "{} is not valid JSON.\n\n  {err}",
                    output::bold(&file.display().to_string()),
                ));
            }
            return Ok(2);
        }
    };

    let pkg: DataPackage = match serde_json::from_value(value) {
        Ok(pkg) => pkg,
        Err(err) => {
            let errors = vec![("schema".to_string(), err.to_string())];
            if ctx.output == OutputMode::Json {
                emit_json(false, file, &errors);
            } else {
                print_failure(ctx, file, &errors);
            }
            return Ok(1);
        }
    };

    let issues = pkg.validate();
    if !issues.is_empty() {
        let errors: Vec<(String, String)> = issues
            .iter()
            .map(|i| (i.field.clone(), i.message.clone()))
            .collect();
        if ctx.output == OutputMode::Json {
            emit_json(false, file, &errors);
        } else {
            print_failure(ctx, file, &errors);
        }
        return Ok(1);
    }

    if ctx.output == OutputMode::Json {
        emit_json(true, file, &[]);
    } else if !ctx.quiet {
        println!();
        output::success_line(&format!(
            "{} is a valid datapackage  {}",
            output::bold(&file.display().to_string()),
            output::muted(&format!("({}@{})", pkg.id, pkg.version)),
        ));
        println!();
    }
    Ok(0)
}

fn emit_json(valid: bool, file: &Path, errors: &[(String, String)]) {
    output::print_json(&json!({
        "valid": valid,
        "file": file.display().to_string(),
        "errors": errors.iter().map(|(field, message)| json!({
            "field": field,
            "message": message,
        })).collect::<Vec<_>>(),
    }));
}

fn print_failure(ctx: &Ctx, file: &Path, errors: &[(String, String)]) {
    if ctx.quiet {
        return;
    }
    eprintln!();
    eprintln!(
        "{} {} has {} validation error(s):",
        console::style("✗").red().bold(),
        output::bold(&file.display().to_string()),
        errors.len(),
    );
    eprintln!();
    for (field, message) in errors {
        eprintln!("  {:<24} {message}", output::bold(field));
    }
    eprintln!();
}
