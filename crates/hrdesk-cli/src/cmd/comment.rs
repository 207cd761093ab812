//! `hd comment` and `hd thread`: the ticket conversation.

use crate::actor;
use crate::output::{OutputMode, pretty_section, render, render_mode};
use clap::Args;
use hrdesk_core::model::message::{Author, Message};
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct CommentArgs {
    pub id: String,

    /// Message text.
    pub body: String,
}

#[derive(Args, Debug)]
pub struct ThreadArgs {
    pub id: String,
}

pub fn write_thread_rows(w: &mut dyn Write, thread: &[Message]) -> io::Result<()> {
    for m in thread {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            m.seq,
            m.created_at.to_rfc3339(),
            m.author,
            m.body
        )?;
    }
    Ok(())
}

pub fn write_thread_pretty(w: &mut dyn Write, thread: &[Message]) -> io::Result<()> {
    pretty_section(w, "Conversation")?;
    for m in thread {
        let when = m.created_at.format("%Y-%m-%d %H:%M");
        match &m.author {
            Author::System => writeln!(w, "{when}  · {}", m.body)?,
            Author::Actor { id } => writeln!(w, "{when}  {id}: {}", m.body)?,
        }
    }
    Ok(())
}

pub fn run_comment(
    args: &CommentArgs,
    actor_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let actor = actor::require_actor(actor_flag)?;
    let mut desk = super::open_desk(project_root)?;
    let id = super::parse_ticket_id(&args.id)?;
    let message = desk.post_message(&id, &actor, &args.body)?;
    render(output, &message, |m, w| {
        writeln!(w, "✓ {} #{} by {}", m.ticket_id, m.seq, m.author)
    })
}

pub fn run_thread(
    args: &ThreadArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let desk = super::open_desk(project_root)?;
    let id = super::parse_ticket_id(&args.id)?;
    let thread = desk.conversation(&id)?;
    render_mode(
        output,
        &thread,
        |t, w| write_thread_rows(w, t),
        |t, w| write_thread_pretty(w, t),
    )
}
