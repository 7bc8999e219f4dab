//! Create a new post or draft

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::FrontMatter;
use crate::Site;

/// Create a new post or draft, returning the created file.
///
/// With `revision_of`, the new file starts from the body of that document
/// and links back to it.
pub fn create_post(
    site: &Site,
    title: &str,
    layout: &str,
    path: Option<&str>,
    revision_of: Option<&str>,
) -> Result<PathBuf> {
    let now = chrono::Local::now();

    // A dated copy of a published body would conflict with the original
    if revision_of.is_some() && layout != "draft" {
        anyhow::bail!("Revisions are created as drafts, got layout {:?}", layout);
    }

    // Determine the target directory based on layout
    let target_dir = match layout {
        "draft" => site.source_dir.join(&site.config.drafts_dir),
        "post" => site.source_dir.join(&site.config.posts_dir),
        other => anyhow::bail!("Unknown layout: {}. Available: post, draft", other),
    };

    // Generate filename
    let filename = if let Some(p) = path {
        format!("{}.md", p)
    } else {
        let slug = slug::slugify(title);
        site.config
            .new_post_name
            .replace(":title", &slug)
            .replace(":year", &now.format("%Y").to_string())
            .replace(":month", &now.format("%m").to_string())
            .replace(":day", &now.format("%d").to_string())
            .replace(":i_month", &now.format("%-m").to_string())
            .replace(":i_day", &now.format("%-d").to_string())
    };
    let file_path = target_dir.join(&filename);

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    // Load scaffold template
    let scaffold_path = site
        .base_dir
        .join("scaffolds")
        .join(format!("{}.md", layout));
    let scaffold_content = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else if layout == "draft" {
        "---\ntitle: {{ title }}\n---\n".to_string()
    } else {
        "---\ntitle: {{ title }}\ndate: {{ date }}\n---\n".to_string()
    };

    // Replace template variables
    let mut content = scaffold_content
        .replace("{{ title }}", title)
        .replace("{{ date }}", &now.format("%Y-%m-%d %H:%M:%S").to_string());

    if let Some(id) = revision_of {
        let corpus = site.load()?;
        let Some(original) = corpus.get(id) else {
            anyhow::bail!("No document with id {:?} to revise", id);
        };

        let (mut fm, _) = FrontMatter::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid scaffold {:?}: {}", scaffold_path, e))?;
        fm.insert("revision_of", serde_yaml::Value::String(id.to_string()));
        content = format!("{}\n{}", fm.to_yaml()?, original.body);
    }

    fs::create_dir_all(&target_dir)?;
    fs::write(&file_path, content)?;

    println!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Run the new command. Without a layout, revisions default to drafts and
/// everything else to the configured default layout.
pub fn run(
    site: &Site,
    title: &str,
    layout: Option<&str>,
    path: Option<&str>,
    revision_of: Option<&str>,
) -> Result<PathBuf> {
    let layout = match (layout, revision_of) {
        (Some(layout), _) => layout,
        (None, Some(_)) => "draft",
        (None, None) => &site.config.default_layout,
    };
    create_post(site, title, layout, path, revision_of)
}
