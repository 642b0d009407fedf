//! Running-tail statistics file reader.
//!
//! Each line is `<tag><word> <count>` with tag `+` (push the word onto the
//! tail, record the tail), `=` (same, then pop) or `-` (just pop, rest of
//! the line ignored). The tail must be empty at end of file; anything else
//! means the file is corrupt.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use ngram_model::WordToken;
use word_core::Hits;

/// Read one statistics file, calling `conv` to turn each raw word into a
/// token and `record` with every recorded tail.
pub fn read_stat_file<C, F>(path: &Path, mut conv: C, mut record: F) -> Result<()>
where
    C: FnMut(&str) -> WordToken,
    F: FnMut(&[WordToken], Hits),
{
    let file = File::open(path).with_context(|| format!("opening stat file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut words: Vec<WordToken> = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        let Some(tag) = line.bytes().next() else {
            continue;
        };
        if tag == b'-' {
            if words.pop().is_none() {
                bail!("unbalanced stat file {} (pop at line {})", path.display(), n + 1);
            }
        } else {
            let Some(k) = line.find(' ') else {
                bail!("malformed stat line {} in {}", n + 1, path.display());
            };
            let cnt: Hits = line[k + 1..]
                .trim()
                .parse()
                .with_context(|| format!("bad count at line {} in {}", n + 1, path.display()))?;
            words.push(conv(&line[1..k]));
            record(&words, cnt);
            if tag == b'=' {
                words.pop();
            }
        }
    }

    if !words.is_empty() {
        bail!(
            "unbalanced stat file {} ({} words left on the tail)",
            path.display(),
            words.len()
        );
    }
    Ok(())
}
