//! Two-pass resolution of template-dependent locations
//!
//! Every class or function template is walked first in gather mode: its
//! generic body is indexed once and expressions whose meaning depends on the
//! template parameters are collected. If any were found the template is
//! walked again in analyze mode, descending into each instantiation, and
//! only the collected locations are emitted.
//!
//! Frames form an explicit stack. Questions are answered by walking from the
//! innermost frame outward, so nested templates compose.

use crate::model::SourceLoc;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Walk the generic body only, collecting dependent locations
    Gather,
    /// Walk instantiations, emitting only collected locations
    Analyze,
}

#[derive(Debug)]
struct TemplateFrame {
    mode: Mode,
    dependent: HashSet<SourceLoc>,
}

/// Stack of open templates
#[derive(Debug, Default)]
pub struct TemplateResolver {
    frames: Vec<TemplateFrame>,
}

impl TemplateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame for a template about to be walked, in gather mode
    pub fn open(&mut self) {
        self.frames.push(TemplateFrame {
            mode: Mode::Gather,
            dependent: HashSet::new(),
        });
    }

    /// Close the innermost frame, returning how many locations it collected
    pub fn close(&mut self) -> Option<usize> {
        self.frames.pop().map(|frame| frame.dependent.len())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.frames.last().map(|frame| frame.mode)
    }

    /// Record `loc` as dependent in the innermost frame and every enclosing
    /// frame that is still gathering
    pub fn mark_dependent(&mut self, loc: SourceLoc) {
        for frame in self.frames.iter_mut().rev() {
            if frame.mode == Mode::Analyze {
                break;
            }
            frame.dependent.insert(loc);
        }
    }

    /// Whether the innermost template needs an analyze pass
    ///
    /// Only the frame's own locations count. Locations inherited from an
    /// enclosing template are resolved by that template's own pass.
    pub fn needs_analysis(&self) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| !frame.dependent.is_empty())
    }

    pub fn switch_to_analyze(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.mode = Mode::Analyze;
        }
    }

    /// True while any open template is in analyze mode
    pub fn should_descend_into_instantiations(&self) -> bool {
        self.frames.iter().any(|frame| frame.mode == Mode::Analyze)
    }

    /// Whether a token at `loc` may be emitted now
    ///
    /// An analyze frame admits the locations it collected. Gathering frames
    /// defer to their parents. Outside any analyze pass everything is
    /// emitted; inside one, a location no frame collected was already
    /// emitted by a gather pass.
    pub fn should_emit(&self, loc: &SourceLoc) -> bool {
        let mut analyzing = false;
        for frame in self.frames.iter().rev() {
            if frame.mode == Mode::Analyze {
                if frame.dependent.contains(loc) {
                    return true;
                }
                analyzing = true;
            }
        }
        !analyzing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileId;

    fn loc(line: u32, column: u32) -> SourceLoc {
        SourceLoc::new(FileId(0), line, column)
    }

    #[test]
    fn test_everything_emits_outside_templates() {
        let resolver = TemplateResolver::new();
        assert!(resolver.should_emit(&loc(1, 0)));
        assert!(!resolver.should_descend_into_instantiations());
        assert!(!resolver.needs_analysis());
    }

    #[test]
    fn test_gather_without_dependencies_skips_analysis() {
        let mut resolver = TemplateResolver::new();
        resolver.open();
        assert!(resolver.should_emit(&loc(2, 4)));
        assert!(!resolver.should_descend_into_instantiations());
        assert!(!resolver.needs_analysis());
        assert_eq!(resolver.close(), Some(0));
    }

    #[test]
    fn test_analyze_emits_only_dependent_locations() {
        let mut resolver = TemplateResolver::new();
        resolver.open();
        resolver.mark_dependent(loc(5, 10));
        assert!(resolver.needs_analysis());

        resolver.switch_to_analyze();
        assert_eq!(resolver.mode(), Some(Mode::Analyze));
        assert!(resolver.should_descend_into_instantiations());
        assert!(resolver.should_emit(&loc(5, 10)));
        assert!(!resolver.should_emit(&loc(6, 2)));
        assert_eq!(resolver.close(), Some(1));
    }

    #[test]
    fn test_dependencies_propagate_to_enclosing_templates() {
        let mut resolver = TemplateResolver::new();
        resolver.open();
        resolver.open();
        resolver.open();
        resolver.mark_dependent(loc(9, 1));
        assert_eq!(resolver.close(), Some(1));
        assert_eq!(resolver.close(), Some(1));
        assert!(resolver.needs_analysis());
        assert_eq!(resolver.close(), Some(1));
    }

    #[test]
    fn test_inner_template_during_outer_analysis() {
        let mut resolver = TemplateResolver::new();
        resolver.open();
        resolver.mark_dependent(loc(3, 0));
        resolver.switch_to_analyze();

        // A member template met inside an instantiation of the outer one
        resolver.open();
        assert!(resolver.should_descend_into_instantiations());
        assert!(resolver.should_emit(&loc(3, 0)));
        assert!(!resolver.should_emit(&loc(4, 0)));

        resolver.mark_dependent(loc(4, 8));
        assert!(resolver.needs_analysis());
        resolver.switch_to_analyze();
        assert!(resolver.should_emit(&loc(4, 8)));
        assert_eq!(resolver.close(), Some(1));

        // Collected while the outer frame was analyzing: not propagated
        assert!(!resolver.should_emit(&loc(4, 8)));
        assert_eq!(resolver.close(), Some(1));
    }

    #[test]
    fn test_inner_analysis_during_outer_gather() {
        let mut resolver = TemplateResolver::new();
        resolver.open();
        resolver.open();
        resolver.mark_dependent(loc(7, 3));
        resolver.switch_to_analyze();
        assert!(resolver.should_emit(&loc(7, 3)));
        assert!(!resolver.should_emit(&loc(8, 0)));
        resolver.close();

        assert!(resolver.needs_analysis());
        assert!(resolver.should_emit(&loc(8, 0)));
    }
}
