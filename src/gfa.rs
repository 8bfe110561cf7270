//! GFA (Graphical Fragment Assembly) loader
//!
//! Reads GFA 1.0 text into a [`GenomeGraph`]. Segments get sequential ids in
//! the order their `S` records appear, links become forward edges, and every
//! `P` or `W` record is one genome whose id is added to each segment it
//! visits. Records may reference segments defined further down the file, so
//! links and paths are resolved after the whole input has been read.

use crate::error::{LayoutError, Result};
use crate::store::{GenomeGraph, GenomeId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Orientation of a segment in a path or link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    fn from_char(c: char, line: usize) -> Result<Self> {
        match c {
            '+' | '>' => Ok(Orientation::Forward),
            '-' | '<' => Ok(Orientation::Reverse),
            _ => Err(LayoutError::GfaParse {
                line,
                message: format!("Invalid orientation: {}", c),
            }),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Forward => write!(f, "+"),
            Orientation::Reverse => write!(f, "-"),
        }
    }
}

/// Header information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    /// Version string
    pub version: Option<String>,
    /// Additional tags
    pub tags: HashMap<String, String>,
}

/// A link waiting for its segments to be resolved
struct PendingLink {
    line: usize,
    from: String,
    to: String,
}

/// A path or walk waiting for its segments to be resolved
struct PendingPath {
    line: usize,
    name: String,
    steps: Vec<(String, Orientation)>,
}

/// A genome graph loaded from GFA, with its segment names
#[derive(Debug, Clone, Default)]
pub struct GfaGraph {
    /// Header information
    pub header: Header,
    /// The loaded topology and genomes
    pub graph: GenomeGraph,
    /// Segment names, indexed by node id
    pub names: Vec<String>,
    ids: HashMap<String, NodeId>,
}

impl GfaGraph {
    /// Load a GFA file from a path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LayoutError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Self::parse(reader)
    }

    /// Load GFA from a buffered reader
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut gfa = GfaGraph::default();
        let mut links = Vec::new();
        let mut paths = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();
            let line_num = line_num + 1;

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            match fields[0] {
                "H" => gfa.parse_header(&fields),
                "S" => gfa.parse_segment(&fields, line_num)?,
                "L" => links.push(parse_link(&fields, line_num)?),
                "P" => paths.push(parse_path(&fields, line_num)?),
                "W" => paths.push(parse_walk(&fields, line_num)?),
                _ => {
                    // Unknown record type, skip
                }
            }
        }

        for link in links {
            let from = gfa.resolve(&link.from, link.line)?;
            let to = gfa.resolve(&link.to, link.line)?;
            gfa.graph.add_edge(from, to);
        }
        for path in paths {
            let genome = gfa.graph.add_genome_name(&path.name);
            for (segment, _) in &path.steps {
                let id = gfa.resolve(segment, path.line)?;
                gfa.graph.add_genome(id, genome);
            }
        }

        log::info!(
            "Loaded {} segments, {} links, {} genomes",
            gfa.graph.node_count(),
            gfa.graph.edge_count(),
            gfa.graph.genome_names.len()
        );
        Ok(gfa)
    }

    fn parse_header(&mut self, fields: &[&str]) {
        for field in fields.iter().skip(1) {
            if let Some((key, value)) = field.split_once(':') {
                if key == "VN" {
                    self.header.version = Some(value.to_string());
                } else {
                    self.header.tags.insert(key.to_string(), value.to_string());
                }
            }
        }
    }

    fn parse_segment(&mut self, fields: &[&str], line: usize) -> Result<()> {
        if fields.len() < 3 {
            return Err(LayoutError::GfaParse {
                line,
                message: "Segment record requires at least 3 fields".to_string(),
            });
        }

        let name = fields[1];
        if self.ids.contains_key(name) {
            return Err(LayoutError::GfaParse {
                line,
                message: format!("Duplicate segment: {}", name),
            });
        }
        let sequence = if fields[2] == "*" { "" } else { fields[2] };

        let id = self.names.len() as NodeId;
        self.graph.add_node(id, sequence, Vec::<GenomeId>::new());
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        Ok(())
    }

    fn resolve(&self, name: &str, line: usize) -> Result<NodeId> {
        self.ids.get(name).copied().ok_or_else(|| LayoutError::GfaParse {
            line,
            message: format!("Reference to undefined segment: {}", name),
        })
    }

    /// Node id of a segment name
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    /// Segment name of a real node id
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    /// Resolve a user-supplied segment: a segment name first, then a raw id
    pub fn lookup(&self, segment: &str) -> Result<NodeId> {
        if let Some(id) = self.id_of(segment) {
            return Ok(id);
        }
        match segment.parse::<NodeId>() {
            Ok(id) if self.name_of(id).is_some() => Ok(id),
            _ => Err(LayoutError::InvalidInput(format!(
                "Segment '{}' not found",
                segment
            ))),
        }
    }
}

fn parse_link(fields: &[&str], line: usize) -> Result<PendingLink> {
    if fields.len() < 5 {
        return Err(LayoutError::GfaParse {
            line,
            message: "Link record requires at least 5 fields".to_string(),
        });
    }

    for field in [fields[2], fields[4]] {
        let c = field.chars().next().ok_or_else(|| LayoutError::GfaParse {
            line,
            message: "Missing link orientation".to_string(),
        })?;
        Orientation::from_char(c, line)?;
    }

    Ok(PendingLink {
        line,
        from: fields[1].to_string(),
        to: fields[3].to_string(),
    })
}

fn parse_path(fields: &[&str], line: usize) -> Result<PendingPath> {
    if fields.len() < 3 {
        return Err(LayoutError::GfaParse {
            line,
            message: "Path record requires at least 3 fields".to_string(),
        });
    }

    let mut steps = Vec::new();
    for step in fields[2].split(',') {
        let step = step.trim();
        if step.is_empty() {
            continue;
        }
        let Some(orient) = step.chars().last().filter(|c| *c == '+' || *c == '-') else {
            return Err(LayoutError::GfaParse {
                line,
                message: format!("Path step missing orientation: {}", step),
            });
        };
        steps.push((
            step[..step.len() - 1].to_string(),
            Orientation::from_char(orient, line)?,
        ));
    }

    Ok(PendingPath {
        line,
        name: fields[1].to_string(),
        steps,
    })
}

fn parse_walk(fields: &[&str], line: usize) -> Result<PendingPath> {
    // W sample haplotype seq_id seq_start seq_end walk
    if fields.len() < 7 {
        return Err(LayoutError::GfaParse {
            line,
            message: "Walk record requires at least 7 fields".to_string(),
        });
    }

    let name = format!("{}#{}#{}", fields[1], fields[2], fields[3]);
    let mut steps: Vec<(String, Orientation)> = Vec::new();
    for c in fields[6].chars() {
        match c {
            '>' | '<' => steps.push((String::new(), Orientation::from_char(c, line)?)),
            _ => match steps.last_mut() {
                Some((segment, _)) => segment.push(c),
                None => {
                    return Err(LayoutError::GfaParse {
                        line,
                        message: "Walk must start with '>' or '<'".to_string(),
                    })
                }
            },
        }
    }
    steps.retain(|(segment, _)| !segment.is_empty());

    Ok(PendingPath { line, name, steps })
}
