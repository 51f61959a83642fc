//! Double-buffered sample tables
//!
//! The main loop stages a new table into the inactive slot, then publishes
//! it by flipping the active index. The sample interrupt only ever reads the
//! active slot, so it never sees a partially written table. Each step runs
//! inside its own short critical section.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::output::waveform::WaveformTable;

struct BankState<const N: usize> {
    tables: [WaveformTable<N>; 2],
    active: usize,
    staged: bool,
    cursor: usize,
}

/// Sample tables shared between the main loop and the sample interrupt
pub struct SampleBank<const N: usize> {
    state: Mutex<RefCell<BankState<N>>>,
}

impl<const N: usize> SampleBank<N> {
    /// Create a bank whose tables hold `level` (usually mid-scale)
    #[must_use]
    pub const fn new(level: i32) -> Self {
        Self {
            state: Mutex::new(RefCell::new(BankState {
                tables: [WaveformTable::flat(level), WaveformTable::flat(level)],
                active: 0,
                staged: false,
                cursor: 0,
            })),
        }
    }

    /// Copy `table` into the inactive slot
    pub fn stage(&self, table: &WaveformTable<N>) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let inactive = 1 - state.active;
            state.tables[inactive] = *table;
            state.staged = true;
        });
    }

    /// Make the staged table the one the interrupt plays
    ///
    /// Returns false if nothing was staged since the last publish.
    pub fn publish(&self) -> bool {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if !state.staged {
                return false;
            }
            state.active = 1 - state.active;
            state.staged = false;
            true
        })
    }

    /// Stage and publish
    pub fn install(&self, table: &WaveformTable<N>) {
        self.stage(table);
        self.publish();
        debug!("waveform table published");
    }

    /// Next sample of the active table; called from the sample interrupt
    pub fn next_sample(&self) -> i32 {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let sample = state.tables[state.active].get(state.cursor);
            state.cursor = (state.cursor + 1) % N;
            sample
        })
    }

    /// Restart playback at the first sample
    pub fn rewind(&self) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).cursor = 0);
    }

    /// Copy of the table being played
    #[must_use]
    pub fn active_table(&self) -> WaveformTable<N> {
        critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            state.tables[state.active]
        })
    }
}
