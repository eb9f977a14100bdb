//! Per-load state shared by the parsers of both grammars.

use crate::board::nets::{NetCodeMap, NetTable, ORPHANED, UNCONNECTED};
use crate::board::zone::Zone;
use crate::error::{BoardError, SourceLocation, Warning, WarningKind};
use crate::options::{LoadPolicy, Progress};

use super::values::Site;

pub struct ParseContext<'p> {
    pub source: String,
    policy: &'p mut dyn LoadPolicy,
    warnings: Vec<Warning>,
    pub net_codes: NetCodeMap,
    segment_fill_answer: Option<bool>,
    total_lines: usize,
    next_checkpoint: usize,
}

impl<'p> ParseContext<'p> {
    pub fn new(source: impl Into<String>, policy: &'p mut dyn LoadPolicy) -> Self {
        Self {
            source: source.into(),
            policy,
            warnings: Vec::new(),
            net_codes: NetCodeMap::default(),
            segment_fill_answer: None,
            total_lines: 0,
            next_checkpoint: 0,
        }
    }

    pub fn site(&self, line: usize, offset: usize) -> Site<'_> {
        Site::new(&self.source, line, offset)
    }

    pub fn location(&self, line: usize, offset: usize) -> SourceLocation {
        SourceLocation::new(self.source.clone(), line, offset)
    }

    pub fn error(&self, line: usize, offset: usize, message: impl Into<String>) -> BoardError {
        BoardError::syntax(self.location(line, offset), message)
    }

    /// Record a recoverable problem and log it.
    pub fn warn(&mut self, kind: WarningKind, location: Option<SourceLocation>, message: String) {
        match &location {
            Some(at) => tracing::warn!(kind = ?kind, "{at}: {message}"),
            None => tracing::warn!(kind = ?kind, "{message}"),
        }
        self.warnings.push(Warning {
            kind,
            location,
            message,
        });
    }

    pub fn warn_at(&mut self, kind: WarningKind, line: usize, offset: usize, message: String) {
        let location = self.location(line, offset);
        self.warn(kind, Some(location), message);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn policy(&mut self) -> &mut dyn LoadPolicy {
        &mut *self.policy
    }

    /// Net of a pad. The written name must agree with the net the code maps
    /// to; otherwise, or when the code is unknown, the pad is orphaned.
    pub fn pad_net(
        &mut self,
        nets: &NetTable,
        file_code: i64,
        name: &str,
        line: usize,
        offset: usize,
    ) -> i32 {
        let code = self.net_codes.map(file_code);
        if code == UNCONNECTED {
            return UNCONNECTED;
        }
        match nets.get(code) {
            None => {
                self.warn_at(
                    WarningKind::UnknownNet,
                    line,
                    offset,
                    format!("pad net code {file_code} is not defined; pad left without net"),
                );
                ORPHANED
            }
            Some(net) if net.name != name => {
                self.warn_at(
                    WarningKind::NetMismatch,
                    line,
                    offset,
                    format!(
                        "pad net name '{name}' does not match net {code} '{}'; pad left without net",
                        net.name
                    ),
                );
                ORPHANED
            }
            Some(_) => code,
        }
    }

    /// Net of a track, via or zone given only by code. Unknown codes fall
    /// back to net 0.
    pub fn item_net(
        &mut self,
        nets: &NetTable,
        file_code: i64,
        what: &str,
        line: usize,
        offset: usize,
    ) -> i32 {
        let code = self.net_codes.map(file_code);
        if nets.contains(code) {
            return code;
        }
        self.warn_at(
            WarningKind::UnknownNet,
            line,
            offset,
            format!("{what} net code {file_code} is not defined; using net 0"),
        );
        UNCONNECTED
    }

    /// A copper zone keeps the net its written name refers to, even when the
    /// code disagrees. A name unknown to the board becomes a new net.
    pub fn zone_net(&mut self, nets: &mut NetTable, zone: &mut Zone, line: usize) {
        if zone.is_rule_area() || !zone.is_on_copper() {
            return;
        }
        if nets.name(zone.net) == zone.net_name && nets.contains(zone.net) {
            return;
        }
        let code = match nets.find_by_name(&zone.net_name) {
            Some(net) => net.code,
            None => {
                let code = nets.add(&zone.net_name);
                self.warn_at(
                    WarningKind::NetMismatch,
                    line,
                    0,
                    format!("zone net '{}' not found; added as net {code}", zone.net_name),
                );
                code
            }
        };
        zone.net = code;
    }

    /// Segment-filled zones need converting to polygon fill. The policy is
    /// asked once per load and the answer reused; declining cancels.
    pub fn confirm_segment_fill(&mut self) -> Result<(), BoardError> {
        let answer = match self.segment_fill_answer {
            Some(answer) => answer,
            None => {
                let answer = self.policy.convert_segment_fill();
                self.segment_fill_answer = Some(answer);
                answer
            }
        };
        if answer {
            Ok(())
        } else {
            Err(BoardError::cancelled(
                "zone segment fill conversion was declined",
            ))
        }
    }

    pub fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
        self.next_checkpoint = self.policy.progress_interval();
    }

    /// Report progress every `progress_interval` lines.
    pub fn checkpoint(&mut self, line: usize) -> Result<(), BoardError> {
        if line < self.next_checkpoint {
            return Ok(());
        }
        self.next_checkpoint = line + self.policy.progress_interval().max(1);
        self.report(line)
    }

    /// Report progress unconditionally.
    pub fn report(&mut self, line: usize) -> Result<(), BoardError> {
        let progress = Progress {
            line,
            total_lines: self.total_lines,
        };
        if self.policy.progress(progress) {
            Ok(())
        } else {
            Err(BoardError::cancelled(format!("load cancelled at line {line}")))
        }
    }
}
