//! Модуль для форматирования и вывода результатов

use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

/// Формат вывода результатов
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(anyhow::anyhow!("Unknown output format: {}", s)),
        }
    }
}

/// Writer для вывода результатов
pub struct OutputWriter {
    writer: Box<dyn Write>,
    format: OutputFormat,
    pretty: bool,
}

impl OutputWriter {
    pub fn new(writer: Box<dyn Write>, format: OutputFormat) -> Self {
        Self { writer, format, pretty: false }
    }

    /// Создает writer для stdout
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(Box::new(io::stdout()), format)
    }

    /// Создает writer для файла
    pub fn file(path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(Box::new(file), format))
    }

    /// Включает pretty-печать для JSON
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Записывает сериализуемый объект
    pub fn write_object<T: Serialize>(&mut self, obj: &T) -> Result<()> {
        let json = if self.pretty || self.format != OutputFormat::Json {
            serde_json::to_string_pretty(obj)?
        } else {
            serde_json::to_string(obj)?
        };
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Записывает строку
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    /// Записывает заголовок
    pub fn write_header(&mut self, header: &str) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.writer, "\n{}", header.bold().blue())?;
                writeln!(self.writer, "{}", "=".repeat(header.len()).blue())?;
            }
            _ => {
                writeln!(self.writer, "{}", header)?;
            }
        }
        Ok(())
    }

    /// Записывает таблицу
    pub fn write_table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.format == OutputFormat::Json {
            let objects: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|row| {
                    let obj: serde_json::Map<String, serde_json::Value> = headers
                        .iter()
                        .zip(row)
                        .map(|(h, cell)| (h.to_string(), serde_json::Value::String(cell)))
                        .collect();
                    serde_json::Value::Object(obj)
                })
                .collect();
            return self.write_object(&objects);
        }

        // Вычисляем ширину колонок
        let mut widths = headers.iter().map(|h| h.len()).collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        for (i, header) in headers.iter().enumerate() {
            if i > 0 {
                write!(self.writer, " │ ")?;
            }
            write!(self.writer, "{:width$}", header, width = widths[i])?;
        }
        writeln!(self.writer)?;

        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                write!(self.writer, "─┼─")?;
            }
            write!(self.writer, "{}", "─".repeat(*width))?;
        }
        writeln!(self.writer)?;

        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(self.writer, " │ ")?;
                }
                match widths.get(i) {
                    Some(width) => write!(self.writer, "{:width$}", cell, width = *width)?,
                    None => write!(self.writer, "{}", cell)?,
                }
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Завершает запись и сбрасывает буфер
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Структура для вывода статистики
#[derive(Debug, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub categories: Vec<(String, usize)>,
    pub duration: Option<String>,
}

impl Statistics {
    /// Выводит статистику в указанный writer
    pub fn write(&self, writer: &mut OutputWriter) -> Result<()> {
        match writer.format {
            OutputFormat::Json => writer.write_object(self),
            OutputFormat::Table => {
                let rows = self
                    .categories
                    .iter()
                    .map(|(name, count)| vec![name.clone(), count.to_string()])
                    .collect();
                writer.write_table(&["kind", "count"], rows)
            }
            OutputFormat::Text => {
                writer.write_header("Statistics")?;
                writer.write_line(&format!("Total items: {}", self.total))?;
                if !self.categories.is_empty() {
                    writer.write_line("\nBy category:")?;
                    for (category, count) in &self.categories {
                        writer.write_line(&format!("  {}: {}", category, count))?;
                    }
                }
                if let Some(duration) = &self.duration {
                    writer.write_line(&format!("\nDuration: {}", duration))?;
                }
                Ok(())
            }
        }
    }
}
