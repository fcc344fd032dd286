//! Interactive menu, used when no identifiers are given on the command line

use std::io::{self, BufRead, Write};

use anyhow::Context;
use bili_audio_dl::{split_batch_list, AudioDownloader, Credential, DownloadConfig, PostProcessor};

use crate::cli::ProgressManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Single,
    Batch,
    Credentials,
    Quit,
}

pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim().to_lowercase().as_str() {
        "1" => Some(MenuChoice::Single),
        "2" => Some(MenuChoice::Batch),
        "3" => Some(MenuChoice::Credentials),
        "q" | "quit" | "exit" => Some(MenuChoice::Quit),
        _ => None,
    }
}

/// Print `label` and read one trimmed line; `None` on end of input
pub fn prompt_from(reader: &mut impl BufRead, label: &str) -> anyhow::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    let read = reader.read_line(&mut line).context("failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_menu() {
    println!();
    println!("=== Bilibili audio downloader ===");
    println!("1. Download one video");
    println!("2. Batch download");
    println!("3. Set login credentials (optional)");
    println!("q. Quit");
}

/// Run the menu until a download finishes or the user quits.
///
/// Returns whether every attempted download succeeded.
pub async fn run(mut config: DownloadConfig, postprocessor: PostProcessor) -> anyhow::Result<bool> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        print_menu();
        let Some(line) = prompt_from(&mut input, "Choose (1/2/3/q): ")? else {
            return Ok(true);
        };

        match parse_choice(&line) {
            Some(MenuChoice::Single) => {
                let Some(entry) = prompt_from(&mut input, "BV id or video URL (e.g. BV1xx411c7mD): ")? else {
                    return Ok(true);
                };
                let downloader = AudioDownloader::new(config.clone())?.with_postprocessor(postprocessor.clone());
                let progress = ProgressManager::new();
                return Ok(downloader.download_one(&entry, Some(progress.callback())).await);
            }
            Some(MenuChoice::Batch) => {
                let Some(list) = prompt_from(&mut input, "BV ids, separated by commas: ")? else {
                    return Ok(true);
                };
                let downloader = AudioDownloader::new(config.clone())?.with_postprocessor(postprocessor.clone());
                let summary = downloader
                    .download_batch(&split_batch_list(&list), || Some(ProgressManager::new().callback()))
                    .await;
                println!(
                    "Batch finished: {} succeeded, {} failed",
                    summary.succeeded.len(),
                    summary.failed.len()
                );
                return Ok(summary.all_succeeded());
            }
            Some(MenuChoice::Credentials) => {
                println!("Only needed for member-only or login-gated videos.");
                println!("Find them in your browser's developer tools under Application > Cookies.");
                let sessdata = prompt_from(&mut input, "SESSDATA (blank to skip): ")?;
                let bili_jct = prompt_from(&mut input, "bili_jct (blank to skip): ")?;
                let buvid3 = prompt_from(&mut input, "buvid3 (blank to skip): ")?;

                config.credential = Credential::from_parts(sessdata, bili_jct, buvid3);
                if config.credential.is_some() {
                    println!("Login credentials set");
                } else {
                    println!("No credentials given, continuing anonymously");
                }
            }
            Some(MenuChoice::Quit) => return Ok(true),
            None => println!("Invalid choice: {line}"),
        }
    }
}
