//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::Site;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    if target_dir.join("_config.yml").exists() {
        anyhow::bail!("A site already exists in {:?}", target_dir);
    }

    // Create directory structure
    fs::create_dir_all(target_dir.join("source/_posts"))?;
    fs::create_dir_all(target_dir.join("source/_drafts"))?;
    fs::create_dir_all(target_dir.join("scaffolds"))?;

    let config_content = r#"# Site
title: Blog
author: ''

# Directory
source_dir: source
public_dir: public
drafts_dir: _drafts
posts_dir: _posts
extensions: [md, markdown]
exclude: []

# Writing
new_post_name: ':title.md'
default_layout: post

# Revision resolution
resolver:
  threshold: 0.8
  shingle_size: 4
  metric: containment
  min_size_ratio: 0.5
  canonical: latest
  follow_revision_links: true

# Export
output:
  file: corpus.json
  history: true
  pretty: true
"#;

    fs::write(target_dir.join("_config.yml"), config_content)?;

    // Create scaffold templates
    let post_scaffold = r#"---
layout: post
title: {{ title }}
date: {{ date }}
categories:
tags:
---
"#;

    let draft_scaffold = r#"---
layout: post
title: {{ title }}
tags:
---
"#;

    fs::write(target_dir.join("scaffolds/post.md"), post_scaffold)?;
    fs::write(target_dir.join("scaffolds/draft.md"), draft_scaffold)?;

    let today = chrono::Local::now().format("%Y-%m-%d");
    let sample_post = format!(
        r#"---
layout: post
title: Hello World
date: {}
tags: [meta]
---

Welcome! This is your first post.

Drafts live in `source/_drafts`. When a draft is published under
`source/_posts`, `postmill resolve` recognises the two as revisions of one
article and exports only the published version.
"#,
        today
    );

    fs::write(target_dir.join("source/_posts/hello-world.md"), sample_post)?;

    Ok(())
}

/// Run the init command with an existing site instance
pub fn run(site: &Site) -> Result<()> {
    init_site(&site.base_dir)
}
