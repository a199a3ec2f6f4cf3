//! MCP342x delta-sigma ADC on the Raspberry Pi I2C bus.
use rppal::i2c::I2c;
use tracing::trace;

use crate::error::{HwError, Result};
use currlog_traits::Transport;

pub struct Mcp342x {
    bus: I2c,
    slave: Option<u8>,
}

impl Mcp342x {
    pub fn open(bus: u8) -> Result<Self> {
        let bus = I2c::with_bus(bus).map_err(|e| HwError::I2c(format!("open i2c bus: {e}")))?;
        Ok(Self { bus, slave: None })
    }

    fn select(&mut self, address: u8) -> Result<()> {
        if self.slave != Some(address) {
            self.bus
                .set_slave_address(u16::from(address))
                .map_err(|e| HwError::I2c(e.to_string()))?;
            self.slave = Some(address);
        }
        Ok(())
    }
}

impl Transport for Mcp342x {
    fn write_config(
        &mut self,
        address: u8,
        config: u8,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.select(address)?;
        self.bus
            .smbus_send_byte(config)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        trace!(address, config, "mcp342x config written");
        Ok(())
    }

    fn read_sample(
        &mut self,
        address: u8,
        register: u8,
    ) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        self.select(address)?;
        let word = self
            .bus
            .smbus_read_word(register)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        trace!(word, "mcp342x raw word");
        Ok(word)
    }
}
