//! Emission sink
//!
//! A per-class append-only text channel with the structural indentation
//! contract: directive lines (leading `.`) are flush-left, branch-target
//! label lines get one level of indentation, every other instruction line
//! gets two. Multi-line instruction strings are re-split and re-indented
//! line by line before being written.

use crate::error::CodegenError;
use std::fs;
use std::path::Path;

/// Prefix of every generated branch-target label
pub const LABEL_PREFIX: &str = "Label_";

/// A finished output unit for one class
#[derive(Debug, Clone)]
pub struct Unit {
    /// Class the unit was generated for
    pub class_name: String,
    /// Full assembly text of the unit
    pub text: String,
}

impl Unit {
    /// File name the unit is written under
    pub fn file_name(&self) -> String {
        format!("{}.j", self.class_name)
    }
}

/// Append-only buffer for the unit currently being emitted
#[derive(Debug, Default)]
pub struct Sink {
    class_name: String,
    buf: String,
}

impl Sink {
    /// Start a fresh unit for `class_name`, discarding any previous buffer
    pub fn open(&mut self, class_name: &str) {
        self.class_name = class_name.to_string();
        self.buf.clear();
    }

    /// Append one command. The command may span several lines; each non-empty
    /// line is classified and indented independently.
    pub fn push(&mut self, command: &str) {
        for line in command.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('.') {
                self.buf.push_str(line);
            } else if is_label_line(line) {
                self.buf.push('\t');
                self.buf.push_str(line);
            } else {
                self.buf.push_str("\t\t");
                self.buf.push_str(line);
            }
            self.buf.push('\n');
        }
    }

    /// Close the unit, flushing the buffer into a `Unit`
    pub fn close(&mut self) -> Unit {
        Unit {
            class_name: std::mem::take(&mut self.class_name),
            text: std::mem::take(&mut self.buf),
        }
    }
}

/// A branch-target line: `Label_<n>:`
fn is_label_line(line: &str) -> bool {
    line.starts_with(LABEL_PREFIX) && line.ends_with(':')
}

/// Write every unit as `<Class>.j` under `dir`. Copying the runtime-support
/// units and invoking the external assembler are the packaging layer's job.
pub fn write_units(units: &[Unit], dir: &Path) -> Result<(), CodegenError> {
    fs::create_dir_all(dir)?;
    for unit in units {
        fs::write(dir.join(unit.file_name()), &unit.text)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_sink(name: &str) -> Sink {
        let mut sink = Sink::default();
        sink.open(name);
        sink
    }

    #[test]
    fn directives_are_flush_left() {
        let mut sink = open_sink("A");
        sink.push(".class public A\n");
        sink.push("ldc 5\n");
        sink.push("Label_0:");
        let unit = sink.close();
        assert_eq!(unit.text, ".class public A\n\t\tldc 5\n\tLabel_0:\n");
    }

    #[test]
    fn multi_line_commands_are_split_and_reindented() {
        let mut sink = open_sink("A");
        sink.push("aload_0\nldc 0\nLabel_3:\n.end method\n");
        let unit = sink.close();
        assert_eq!(
            unit.text,
            "\t\taload_0\n\t\tldc 0\n\tLabel_3:\n.end method\n"
        );
    }

    #[test]
    fn close_resets_the_buffer() {
        let mut sink = open_sink("A");
        sink.push("ldc 1");
        let first = sink.close();
        sink.open("B");
        sink.push("ldc 2");
        let second = sink.close();
        assert_eq!(first.class_name, "A");
        assert_eq!(second.class_name, "B");
        assert!(!second.text.contains("ldc 1"));
    }
}
