use crate::cmd::block_on;
use crate::output::{print_json, print_table, timestamp};
use crate::root::{open_desk, require_actor};
use anyhow::Context;
use clap::{Args, Subcommand};
use helpdesk_core::article::{parse_tags, ArticleInput};
use helpdesk_core::view::{ArticleQuery, ArticleView};
use std::path::Path;

#[derive(Args)]
pub struct ArticleArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    /// Comma-separated tags
    #[arg(long, default_value = "")]
    tags: String,
    #[arg(long)]
    sector: String,
    /// Resolved ticket this article was drafted from
    #[arg(long = "from-ticket")]
    source_ticket_id: Option<String>,
}

impl From<ArticleArgs> for ArticleInput {
    fn from(a: ArticleArgs) -> Self {
        ArticleInput {
            title: a.title,
            content: a.content,
            tags: parse_tags(&a.tags),
            sector: a.sector,
            source_ticket_id: a.source_ticket_id,
        }
    }
}

#[derive(Subcommand)]
pub enum KbSubcommand {
    /// Search the knowledge base
    List {
        /// Case-insensitive match on title, content or tags
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sector: Option<String>,
    },
    /// Show one article
    Show { id: String },
    /// Write a new article
    Create(ArticleArgs),
    /// Replace an article's fields
    Edit {
        id: String,
        #[command(flatten)]
        fields: ArticleArgs,
    },
    /// Approve or withdraw an article
    Approve { id: String },
    /// Flag an approved article for review
    Review {
        id: String,
        #[arg(long)]
        note: String,
        /// Proposed replacement content
        #[arg(long)]
        content: Option<String>,
    },
    /// Clear a review request and approve the article
    Validate { id: String },
    /// Delete an article
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Draft an article from a resolved ticket
    Import {
        ticket_id: String,
        /// Store the draft immediately instead of printing it
        #[arg(long)]
        save: bool,
    },
}

pub fn run(
    root: &Path,
    actor: Option<&str>,
    subcmd: KbSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let me = require_actor(actor)?;
    let desk = open_desk(root)?;

    match subcmd {
        KbSubcommand::List { search, sector } => {
            let articles = desk.articles(
                me,
                &ArticleQuery {
                    text: search,
                    sector,
                },
            )?;
            if json {
                return print_json(&articles);
            }
            if articles.is_empty() {
                println!("No articles.");
                return Ok(());
            }
            let rows = articles
                .iter()
                .map(|v| {
                    vec![
                        v.article.id.clone(),
                        v.state.to_string(),
                        v.article.sector.clone(),
                        v.article.tags.join(","),
                        timestamp(&v.article.created_at),
                        v.article.title.clone(),
                    ]
                })
                .collect();
            print_table(&["ID", "STATE", "SECTOR", "TAGS", "CREATED", "TITLE"], rows);
            Ok(())
        }
        KbSubcommand::Show { id } => {
            let view = desk.article(me, &id)?;
            if json {
                return print_json(&view);
            }
            print_article(&view);
            Ok(())
        }
        KbSubcommand::Create(args) => {
            let view = desk.create_article(me, args.into())?;
            done(&view, "Created", json)
        }
        KbSubcommand::Edit { id, fields } => {
            let view = desk.edit_article(me, &id, fields.into())?;
            done(&view, "Updated", json)
        }
        KbSubcommand::Approve { id } => {
            let view = desk.toggle_approval(me, &id)?;
            done(&view, "Toggled approval of", json)
        }
        KbSubcommand::Review { id, note, content } => {
            let view = desk.request_review(me, &id, &note, content.as_deref())?;
            done(&view, "Requested review of", json)
        }
        KbSubcommand::Validate { id } => {
            let view = desk.validate_review(me, &id)?;
            done(&view, "Validated", json)
        }
        KbSubcommand::Delete { id, yes } => {
            let removed = desk.delete_article(me, &id, yes)?;
            if json {
                return print_json(&removed);
            }
            println!("Deleted {} ({})", removed.id, removed.title);
            Ok(())
        }
        KbSubcommand::Import { ticket_id, save } => {
            let config = desk.config().context("failed to load config")?;
            let classifier = helpdesk_classifier::from_config(&config.classifier);
            let prefill = block_on(desk.import_ticket(me, &ticket_id, classifier.as_ref()))??;

            if save {
                let view = desk.create_article(me, prefill.input)?;
                return done(&view, "Created", json);
            }
            if json {
                return print_json(&prefill);
            }
            if !prefill.complete {
                println!("The ticket history was too thin to draft from; only the title was kept.\n");
            }
            println!("title:  {}", prefill.input.title);
            println!("sector: {}", prefill.input.sector);
            println!("tags:   {}", prefill.input.tags.join(", "));
            println!("\n{}", prefill.input.content);
            Ok(())
        }
    }
}

fn print_article(view: &ArticleView) {
    let a = &view.article;
    println!("{}: {}", a.id, a.title);
    println!("  state:  {}", view.state);
    println!("  sector: {}", a.sector);
    println!("  tags:   {}", a.tags.join(", "));
    println!("  author: {}", a.author_id);
    if let Some(t) = &a.source_ticket_id {
        println!("  source: {t}");
    }
    if let Some(note) = &a.review_note {
        println!("  review: {note}");
    }
    println!("\n{}", a.content);
}

fn done(view: &ArticleView, verb: &str, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(view);
    }
    println!("{verb} {} ({})", view.article.id, view.state);
    Ok(())
}
