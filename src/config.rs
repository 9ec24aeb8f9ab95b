//! Buffer sizing for channel input and output.

use std::io::{Read, Write};

use crate::io::{BufferedChannelInput, BufferedChannelOutput};

/// Default capacity of channel buffers, in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;

/// Builder for buffered channel inputs and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    input_capacity: usize,
    output_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            input_capacity: DEFAULT_BUFFER_CAPACITY,
            output_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl BufferConfig {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets the capacity of input buffers.
    pub fn input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity;
        self
    }

    /// Sets the capacity of output buffers.
    pub fn output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// Builds an input with no channel bound yet.
    pub fn build_input<R: Read>(&self) -> BufferedChannelInput<R> {
        BufferedChannelInput::new(self.input_capacity)
    }

    pub fn build_input_for<R: Read>(&self, channel: R) -> BufferedChannelInput<R> {
        BufferedChannelInput::with_channel(channel, self.input_capacity)
    }

    /// Builds an output with no channel bound yet.
    pub fn build_output<W: Write>(&self) -> BufferedChannelOutput<W> {
        BufferedChannelOutput::new(self.output_capacity)
    }

    pub fn build_output_for<W: Write>(&self, channel: W) -> BufferedChannelOutput<W> {
        BufferedChannelOutput::with_channel(channel, self.output_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{PackInput, PackOutput};
    use std::io::Cursor;

    #[test]
    fn defaults() {
        let config = BufferConfig::default();
        let input: BufferedChannelInput<Cursor<Vec<u8>>> = config.build_input();
        let output: BufferedChannelOutput<Vec<u8>> = config.build_output();
        assert_eq!(input.capacity(), DEFAULT_BUFFER_CAPACITY);
        assert_eq!(output.capacity(), DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn builder_sets_capacities() {
        let config = BufferConfig::builder()
            .input_capacity(16)
            .output_capacity(32);

        let mut output = config.build_output_for(Vec::new());
        assert_eq!(output.capacity(), 32);
        output.write_i16(0x0102).unwrap();

        let bytes = output.into_inner().unwrap().unwrap();
        let mut input = config.build_input_for(Cursor::new(bytes));
        assert_eq!(input.capacity(), 16);
        assert_eq!(input.read_i16().unwrap(), 0x0102);
    }
}
