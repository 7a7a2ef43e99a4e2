use std::collections::VecDeque;
use std::fmt;

const MAX_KEPT_NOTICES: usize = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Notice_Kind {
    /// New code is running on the same state.
    Reloaded,
    /// New code is running on a fresh state: the old one was discarded.
    State_Lost,
    /// The new code could not be loaded: the old one keeps running.
    Reload_Failed,
    /// The game asked to start over.
    Restarted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: Notice_Kind,
    pub frame: u64,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self.kind {
            Notice_Kind::Reloaded => "RELOADED",
            Notice_Kind::State_Lost => "STATE LOST",
            Notice_Kind::Reload_Failed => "RELOAD FAILED",
            Notice_Kind::Restarted => "RESTARTED",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

/// User-visible events. Every notice is logged when recorded; the host then hands the
/// ones not yet shown to the platform.
#[derive(Default)]
pub struct Notice_Log {
    notices: VecDeque<Notice>,
    n_unshown: usize,
    frame: u64,
}

impl Notice_Log {
    pub fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    pub fn push(&mut self, kind: Notice_Kind, message: impl Into<String>) {
        let notice = Notice {
            kind,
            frame: self.frame,
            message: message.into(),
        };
        match kind {
            Notice_Kind::Reloaded => lok!("{}", notice),
            Notice_Kind::Restarted => linfo!("{}", notice),
            Notice_Kind::State_Lost => lwarn!("{}", notice),
            Notice_Kind::Reload_Failed => lerr!("{}", notice),
        }

        if self.notices.len() == MAX_KEPT_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
        self.n_unshown = (self.n_unshown + 1).min(self.notices.len());
    }

    /// Returns the notices recorded since the last call.
    pub fn take_unshown(&mut self) -> Vec<Notice> {
        let first = self.notices.len() - self.n_unshown;
        self.n_unshown = 0;
        self.notices.iter().skip(first).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub fn count(&self, kind: Notice_Kind) -> usize {
        self.notices.iter().filter(|n| n.kind == kind).count()
    }
}
