// bases/download_cli/src/output.rs
use media_downloader::{ContentListing, ContentPaths, DownloadOutcome, ProgressEvent};
use std::io::Write;

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_listing(&self, listing: &ContentListing) {
        println!("Found {}: {}", listing.kind, listing.label);
        if listing.is_collection() {
            println!("This is a playlist with {} videos.", listing.len());
        }
        println!();
        println!("{:>4}  {:<60} {:>9}  ID", "No.", "Title", "Duration");
        for item in &listing.items {
            println!(
                "{:>4}  {:<60} {:>9}  {}",
                item.position,
                truncate(&item.title, 60),
                item.duration_label(),
                item.id
            );
        }
        println!();
    }

    pub fn print_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Processing {
                index,
                total,
                title,
            } => println!("Processing {} of {}: {}", index, total, title),
            ProgressEvent::Downloading { percent, .. } => {
                print!("\r  downloading {:5.1}%", percent);
                let _ = std::io::stdout().flush();
            }
            ProgressEvent::ItemDone { title, .. } => println!("\r  ✅ Completed: {}", title),
            ProgressEvent::ItemFailed { title, reason, .. } => {
                println!("\r  ❌ Error downloading: {}", title);
                println!("     Reason: {}", reason);
            }
            ProgressEvent::OverallProgress { fraction } => {
                if self.verbose {
                    println!("  overall {:.0}%", fraction * 100.0);
                }
            }
            ProgressEvent::Cancelled { remaining } => {
                println!("Cancelled, {} item(s) not started", remaining)
            }
        }
    }

    pub fn print_summary(&self, outcome: &DownloadOutcome, paths: Option<&ContentPaths>) {
        println!();
        println!("Download Summary");
        println!("  ✅ Successfully downloaded: {} videos", outcome.success_count);
        println!("  ❌ Failed to download:      {} videos", outcome.failed_count);
        if outcome.was_cancelled() {
            println!("  ⏹  Not started:             {} videos", outcome.skipped_count);
        }

        if !outcome.failed_titles.is_empty() {
            println!("\nFailed videos:");
            for (i, title) in outcome.failed_titles.iter().enumerate() {
                println!("  {}. {}", i + 1, title);
            }
        }

        if let Some(paths) = paths {
            println!("\nFiles saved to: {}", paths.root.display());
        }

        if self.verbose {
            let elapsed = outcome.finished_at - outcome.started_at;
            println!("Elapsed: {:.1} seconds", elapsed.num_milliseconds() as f64 / 1000.0);
        }
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
