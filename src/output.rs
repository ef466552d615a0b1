//! CSV sinks for the three experiment types, following the teacher's
//! `write_matrix_tsv` precedent: a hand-rolled `BufWriter` + `write!`,
//! no `csv` crate — nothing in this family of codebases reaches for one.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::harness::{ByMRow, RandomRow, SimilarityRow};

/// Owns the two CSV files (`<name>.csv`, `<name>_by_m.csv`) a random or
/// single-text experiment writes into.
pub struct RunOutputManager {
    main: BufWriter<File>,
    by_m: BufWriter<File>,
}

impl RunOutputManager {
    pub fn create(output_dir: &Path, name: &str, header_fields: &[&str]) -> Result<Self> {
        let main_path = output_dir.join(format!("{name}.csv"));
        let by_m_path = output_dir.join(format!("{name}_by_m.csv"));
        let mut main = BufWriter::new(File::create(main_path)?);
        let mut by_m = BufWriter::new(File::create(by_m_path)?);

        write!(main, "Alg")?;
        for f in header_fields {
            write!(main, ",{f}")?;
        }
        writeln!(
            main,
            ",insert_time_s,avg_insert_ms,search_time_s,avg_search_ms,miss_time_s,avg_miss_ms,size_bytes,extra,total_time_s,avg_total_ms"
        )?;

        write!(by_m, "Alg")?;
        for f in header_fields {
            write!(by_m, ",{f}")?;
        }
        writeln!(by_m, ",search_time_ms,avg_search_ms,miss_time_ms,avg_miss_ms,m")?;

        Ok(RunOutputManager { main, by_m })
    }

    pub fn write_row(&mut self, header_values: &[String], row: &RandomRow) -> Result<()> {
        write!(self.main, "{}", row.alg)?;
        for v in header_values {
            write!(self.main, ",{v}")?;
        }
        writeln!(
            self.main,
            ",{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{},{:.6},{:.6},{:.6}",
            row.insert_time_s,
            row.avg_insert_ms,
            row.search_time_s,
            row.avg_search_ms,
            row.miss_time_s,
            row.avg_miss_ms,
            row.size_bytes,
            row.extra,
            row.total_time_s,
            row.avg_total_ms,
        )?;
        Ok(())
    }

    pub fn write_by_m_row(&mut self, header_values: &[String], row: &ByMRow) -> Result<()> {
        write!(self.by_m, "{}", row.alg)?;
        for v in header_values {
            write!(self.by_m, ",{v}")?;
        }
        writeln!(
            self.by_m,
            ",{:.6},{:.6},{:.6},{:.6},{}",
            row.search_time_ms, row.avg_search_ms, row.miss_time_ms, row.avg_miss_ms, row.m
        )?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.main.flush()?;
        self.by_m.flush()?;
        Ok(())
    }
}

impl Drop for RunOutputManager {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Owns the single CSV file a similarity experiment writes into.
pub struct SimilarityOutputManager {
    sink: BufWriter<File>,
}

impl SimilarityOutputManager {
    pub fn create(output_dir: &Path, name: &str) -> Result<Self> {
        let path = output_dir.join(format!("{name}.csv"));
        let mut sink = BufWriter::new(File::create(path)?);
        writeln!(
            sink,
            "Alg,text1,text2,i,insert_time_s,avg_insert_ms,search_time_s,avg_search_ms,size_bytes,extra,total_time,similarity"
        )?;
        Ok(SimilarityOutputManager { sink })
    }

    pub fn write_row(&mut self, row: &SimilarityRow) -> Result<()> {
        writeln!(
            self.sink,
            "{},{},{},{},{:.6},{:.6},{:.6},{:.6},{},{:.6},{:.6},{:.6}",
            row.alg,
            row.text1,
            row.text2,
            row.i,
            row.insert_time_s,
            row.avg_insert_ms,
            row.search_time_s,
            row.avg_search_ms,
            row.size_bytes,
            row.extra,
            row.total_time,
            row.similarity,
        )?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

impl Drop for SimilarityOutputManager {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
