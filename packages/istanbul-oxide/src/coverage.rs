/// Branch outcome coverage accumulated for a single source line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coverage {
    pub covered: u32,
    pub total: u32,
    pub coverage: f32,
}

impl Coverage {
    pub fn new(covered: u32, total: u32, coverage: f32) -> Coverage {
        Coverage {
            covered,
            total,
            coverage,
        }
    }

    /// Branch outcomes on the line which were never taken.
    pub fn uncovered(&self) -> u32 {
        self.total - self.covered
    }
}
