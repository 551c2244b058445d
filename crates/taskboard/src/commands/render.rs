use std::io::{self, Write};

use taskboard_core::Task;
use time::format_description::well_known::Rfc3339;

pub fn task_table<W: Write>(tasks: &[Task], out: &mut W) -> io::Result<()> {
    writeln!(out, "ID | Priority | Done | Text | Created")?;
    writeln!(out, "-- | -------- | ---- | ---- | -------")?;

    for task in tasks {
        let done = if task.completed { "yes" } else { "no" };
        let created = task
            .created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_owned());
        writeln!(
            out,
            "{} | {} | {} | {} | {}",
            task.id, task.priority, done, task.text, created
        )?;
    }
    Ok(())
}
