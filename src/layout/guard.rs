//! Bounds on the work a single layout call may do.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Resource};

/// Caller-supplied maximums. The defaults are generous but finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceLimits {
    /// Maximum nesting depth of flex containers. The root container is
    /// depth 1.
    pub max_depth: usize,
    /// Maximum flex lines a single container may break into.
    pub max_lines: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_lines: 1000,
        }
    }
}

/// Depth counter threaded by value through the recursive passes. Each
/// traversal starts from a fresh guard, so nothing carries over between
/// layout calls.
#[derive(Debug, Clone, Copy)]
pub struct ResourceGuard {
    limits: ResourceLimits,
    depth: usize,
}

impl ResourceGuard {
    pub fn new(limits: ResourceLimits) -> Self {
        Self { limits, depth: 0 }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The guard for one container level deeper.
    pub fn descend(&self) -> Result<ResourceGuard, LayoutError> {
        let depth = self.depth + 1;
        if depth > self.limits.max_depth {
            return Err(LayoutError::ResourceLimitExceeded {
                resource: Resource::Depth,
                limit: self.limits.max_depth,
                actual: depth,
            });
        }
        Ok(ResourceGuard { depth, ..*self })
    }

    /// Check the number of flex lines one container produced.
    pub fn check_lines(&self, count: usize) -> Result<(), LayoutError> {
        if count > self.limits.max_lines {
            return Err(LayoutError::ResourceLimitExceeded {
                resource: Resource::Lines,
                limit: self.limits.max_lines,
                actual: count,
            });
        }
        Ok(())
    }
}
