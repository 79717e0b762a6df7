use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input};
use remap_sources::{existing_sitemaps, parse_sitemap_file, SitemapFetcher};
use std::path::{Path, PathBuf};

/// Typed at the sitemap prompt to stop entering URLs.
pub const FINISH_WORD: &str = "finishsitemaps";

/// Files gathered by the interactive wizard.
pub struct WizardInputs {
    pub input: PathBuf,
    pub sitemaps: Vec<PathBuf>,
}

/// Asks for the old-URL table and sitemaps; `None` when the user bails out.
pub async fn run(sitemaps_dir: &Path, fetcher: &SitemapFetcher) -> Result<Option<WizardInputs>> {
    println!("{}", style("URL matching wizard").bold());
    println!("1) Enter the CSV or Excel file that lists the old URLs.");
    println!("2) Enter sitemap URLs one by one; type '{FINISH_WORD}' to start matching.");
    println!(
        "3) Typing '{FINISH_WORD}' right away offers the sitemaps already in '{}'.",
        sitemaps_dir.display()
    );
    println!("4) Each sitemap is downloaded with up to 10 attempts.\n");

    let Some(input) = ask_input_file()? else {
        println!("No input. Exiting.");
        return Ok(None);
    };

    let Some(sitemaps) = ask_sitemaps(sitemaps_dir, fetcher).await? else {
        println!("Exiting.");
        return Ok(None);
    };
    if sitemaps.is_empty() {
        println!("No sitemaps provided. Exiting.");
        return Ok(None);
    }

    Ok(Some(WizardInputs { input, sitemaps }))
}

/// Sitemap URLs typed one per line until the finish word or end of input.
pub fn ask_sitemap_urls() -> Result<Vec<String>> {
    println!("Enter sitemap URLs one by one. Type '{FINISH_WORD}' to continue.");
    let mut urls = Vec::new();
    while let Some(line) = ask_sitemap_line()? {
        if line.eq_ignore_ascii_case(FINISH_WORD) {
            break;
        }
        urls.push(line);
    }
    Ok(urls)
}

fn ask_input_file() -> Result<Option<PathBuf>> {
    loop {
        let raw: String = match Input::new()
            .with_prompt("Path to the CSV or Excel file with old URLs")
            .allow_empty(true)
            .interact_text()
        {
            Ok(raw) => raw,
            Err(err) => {
                log::debug!("Prompt closed: {err}");
                return Ok(None);
            }
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let candidate = PathBuf::from(raw);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
        println!("{}", style("File not found, try again.").red());
    }
}

/// `Ok(None)` means the user chose to stop after a failed download.
async fn ask_sitemaps(
    sitemaps_dir: &Path,
    fetcher: &SitemapFetcher,
) -> Result<Option<Vec<PathBuf>>> {
    println!("\nEnter sitemap URLs now. Type '{FINISH_WORD}' to proceed.");
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut first_entry = true;

    while let Some(line) = ask_sitemap_line()? {
        if line.eq_ignore_ascii_case(FINISH_WORD) {
            if first_entry && paths.is_empty() {
                first_entry = false;
                if offer_existing(sitemaps_dir, &mut paths)? {
                    break;
                }
                continue;
            }
            break;
        }

        first_entry = false;
        let index = paths.len() + 1;
        match fetch_with_extra_round(fetcher, &line, sitemaps_dir, index).await? {
            Some(path) => paths.push(path),
            None => {
                if !confirm("Download failed. Continue with the next sitemap?", false)? {
                    return Ok(None);
                }
            }
        }
    }

    Ok(Some(paths))
}

/// Returns true when the user accepted the existing sitemaps.
fn offer_existing(sitemaps_dir: &Path, paths: &mut Vec<PathBuf>) -> Result<bool> {
    println!("\nChecking {} for existing sitemaps...", sitemaps_dir.display());
    let existing = existing_sitemaps(sitemaps_dir)?;
    if existing.is_empty() {
        println!("No sitemaps found in '{}'.", sitemaps_dir.display());
        println!("Please enter sitemap URLs:");
        return Ok(false);
    }

    print_sitemap_stats(&existing);
    if confirm("Use these existing sitemaps?", true)? {
        paths.extend(existing);
        return Ok(true);
    }
    println!("Please enter sitemap URLs manually:");
    Ok(false)
}

async fn fetch_with_extra_round(
    fetcher: &SitemapFetcher,
    url: &str,
    dir: &Path,
    index: usize,
) -> Result<Option<PathBuf>> {
    if let Ok(path) = fetcher.fetch(url, dir, index).await {
        return Ok(Some(path));
    }
    if !confirm("Download failed. Try 10 more attempts?", false)? {
        return Ok(None);
    }
    Ok(fetcher.fetch(url, dir, index).await.ok())
}

fn print_sitemap_stats(paths: &[PathBuf]) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("Found {} sitemap file(s):", paths.len());
    println!("{rule}");
    for (idx, path) in paths.iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match parse_sitemap_file(path) {
            Ok(urls) => println!("{}. {name}: {} URLs", idx + 1, urls.len()),
            Err(err) => println!(
                "{}. {name}: {}",
                idx + 1,
                style(format!("error reading ({err})")).red()
            ),
        }
    }
    println!("{rule}\n");
}

/// Next non-empty line, or `None` once the prompt is closed.
fn ask_sitemap_line() -> Result<Option<String>> {
    loop {
        let line: String = match Input::new()
            .with_prompt(format!("Sitemap URL (or '{FINISH_WORD}')"))
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(err) => {
                log::debug!("Prompt closed: {err}");
                return Ok(None);
            }
        };
        let line = line.trim();
        if !line.is_empty() {
            return Ok(Some(line.to_string()));
        }
    }
}

fn confirm(prompt: &str, default: bool) -> Result<bool> {
    match Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
    {
        Ok(answer) => Ok(answer),
        Err(err) => {
            log::debug!("Prompt closed: {err}");
            Ok(default)
        }
    }
}
