// Colored terminal output for results, history tables and admin stats.
//
// This module handles all terminal-specific formatting: colors, tables,
// text bar charts. The main.rs command handlers delegate here.

use colored::Colorize;

use super::{percent, truncate_chars};
use crate::models::{iso_millis, DetectionResult, Language, Settings};
use crate::stats::{AdminStats, ResultFilter};

const BAR_WIDTH: usize = 30;

/// Display a single analysis result as a card.
pub fn display_result(result: &DetectionResult) {
    let headline = if result.is_toxic {
        "Toxic Content Detected".red().bold()
    } else {
        "Content is Clean".green().bold()
    };
    let subline = if result.is_toxic {
        "This content may contain cyberbullying or harmful language"
    } else {
        "No harmful content detected in this text"
    };

    println!(
        "\n{}  {}",
        headline,
        colorize_confidence(result.confidence, &format!("{} confident", percent(result.confidence)))
    );
    println!("  {}", subline.dimmed());
    println!();
    println!("  Text:       {}", result.text);
    println!("  Language:   {}", language_label(result.language));
    println!("  Confidence: {}", percent(result.confidence));
    println!(
        "  Processed:  {}",
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let categories: Vec<String> = result
        .categories
        .iter()
        .map(|c| {
            if result.is_toxic {
                c.red().to_string()
            } else {
                c.blue().to_string()
            }
        })
        .collect();
    println!("  Categories: {}", categories.join(", "));
    println!("  ID:         {}", result.id.dimmed());

    if let Some(feedback) = result.feedback {
        println!("  Feedback:   {}", feedback.as_str());
    }
}

/// Display a history table, newest first, limited to `limit` rows.
pub fn display_history(results: &[&DetectionResult], filter: ResultFilter, limit: usize) {
    if results.is_empty() {
        println!("No detection results found.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Detection History ({}, {} results) ===",
            filter,
            results.len()
        )
        .bold()
    );
    println!();
    println!(
        "  {:<24} {:<42} {:<8} {:<6} {:>6}  {}",
        "ID".dimmed(),
        "Text".dimmed(),
        "Lang".dimmed(),
        "Status".dimmed(),
        "Conf".dimmed(),
        "Categories".dimmed(),
    );
    println!("  {}", "-".repeat(110).dimmed());

    for result in results.iter().rev().take(limit) {
        let status = if result.is_toxic {
            format!("{:<6}", "Toxic").red()
        } else {
            format!("{:<6}", "Clean").green()
        };
        println!(
            "  {:<24} {:<42} {:<8} {} {:>6}  {}",
            result.id,
            truncate_chars(&result.text, 38),
            result.language.as_str(),
            status,
            percent(result.confidence),
            result.categories.join(", "),
        );
    }

    if results.len() > limit {
        println!(
            "\n  {}",
            format!("Showing the {limit} most recent of {} results.", results.len()).dimmed()
        );
    }
}

/// Display the admin dashboard numbers.
pub fn display_stats(stats: &AdminStats) {
    println!("\n{}", "=== Admin Dashboard ===".bold());
    println!();
    println!("  Total analyzed:  {}", stats.total_analyzed);
    println!(
        "  Toxic detected:  {}",
        stats.toxic_detected.to_string().red()
    );
    println!(
        "  Clean messages:  {}",
        stats.clean_messages.to_string().green()
    );
    println!(
        "  Avg confidence:  {}",
        percent(stats.avg_confidence).purple()
    );

    println!("\n  {}", "Language Distribution".bold());
    let entries = stats.language_breakdown.entries();
    let max = entries.iter().map(|(_, count)| *count).max().unwrap_or(0);
    for (language, count) in entries {
        println!(
            "    {:<8} {:>5}  {}",
            language.display_name(),
            count,
            bar(count, max).blue()
        );
    }

    println!("\n  {}", "Detection Results".bold());
    let max = stats.toxic_detected.max(stats.clean_messages);
    println!(
        "    {:<8} {:>5}  {}",
        "Toxic",
        stats.toxic_detected,
        bar(stats.toxic_detected, max).red()
    );
    println!(
        "    {:<8} {:>5}  {}",
        "Clean",
        stats.clean_messages,
        bar(stats.clean_messages, max).green()
    );
}

/// Display the current settings record.
pub fn display_settings(settings: &Settings) {
    println!("\n{}", "=== Settings ===".bold());
    println!("  Sensitivity:     {}", settings.sensitivity.as_str());
    println!("  Enable feedback: {}", settings.enable_feedback);
    println!("  Auto save:       {}", settings.auto_save);
}

/// One-line summary used by batch analysis.
pub fn display_result_line(result: &DetectionResult) {
    let status = if result.is_toxic {
        "TOXIC".red().bold()
    } else {
        "clean".green()
    };
    println!(
        "  {} {:>6}  {:<8} {}  {}",
        status,
        percent(result.confidence),
        result.language.as_str(),
        truncate_chars(&result.text, 60),
        iso_millis::format(&result.timestamp).dimmed(),
    );
}

fn language_label(language: Language) -> String {
    match language {
        Language::Mixed => format!("{} (multiple scripts)", language.display_name()),
        _ => language.display_name().to_string(),
    }
}

/// Color a label by confidence band: green >= 0.8, yellow >= 0.6, red below.
fn colorize_confidence(confidence: f64, label: &str) -> colored::ColoredString {
    if confidence >= 0.8 {
        label.green()
    } else if confidence >= 0.6 {
        label.yellow()
    } else {
        label.red()
    }
}

fn bar(value: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = (value * BAR_WIDTH).div_ceil(max).min(BAR_WIDTH);
    "█".repeat(filled)
}
