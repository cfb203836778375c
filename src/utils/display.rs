use colored::*;
use std::io::Write;

/// Boxed program banner followed by the exit hint.
pub fn print_banner(title: &str) {
    let width = 46;
    println!();
    println!("{}", format!("╔{}╗", "═".repeat(width)).bright_cyan());
    println!("{}", format!("║{:^width$}║", title, width = width).bright_cyan().bold());
    println!("{}", format!("╚{}╝", "═".repeat(width)).bright_cyan());
    println!("Type 'exit' or 'quit' to end the session.");
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_warning(text: &str) {
    println!("{}", text.yellow());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
    let _ = std::io::stdout().flush();
}
