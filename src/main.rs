//! HP 4261A USB Adapter Main Application
//!
//! Entry point for the STM32G474-based adapter firmware.
//! Initializes the instrument bus and the USB serial port, then serves host
//! commands and continuous-mode readings from a single loop.

#![no_std]
#![no_main]

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::time::Hertz;
use embassy_stm32::usb::Driver;
use embassy_stm32::{bind_interrupts, peripherals, usb};
use embassy_time::Delay;
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, UsbDevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use hp4261a_usb::bus::InstrumentBus;
use hp4261a_usb::dispatcher::Dispatcher;
use hp4261a_usb::hal::expander::{I2cAddress, Tca9555Bus};
use hp4261a_usb::hal::pins::McuPins;
use hp4261a_usb::prelude::*;
use hp4261a_usb::protocol::LineBuffer;
use hp4261a_usb::usb::cdc::{self, CdcState, UsbDeviceInfo, UsbStrings};

bind_interrupts!(struct Irqs {
    USB_LP => usb::InterruptHandler<peripherals::USB>;
});

type UsbDriver = Driver<'static, peripherals::USB>;

type AdapterDispatcher = Dispatcher<
    Tca9555Bus<I2c<'static, Blocking>>,
    McuPins<Input<'static>, Output<'static>>,
    Delay,
>;

static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CDC_STATE: StaticCell<CdcState<'static>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("HP4261A USB adapter v{}", env!("CARGO_PKG_VERSION"));

    // USB needs a 48 MHz clock; HSI48 trimmed from USB SOF
    let mut config = embassy_stm32::Config::default();
    {
        use embassy_stm32::rcc::{mux, Hsi48Config};
        config.rcc.hsi48 = Some(Hsi48Config {
            sync_from_usb: true,
        });
        config.rcc.mux.clk48sel = mux::Clk48sel::HSI48;
    }
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    // I2C1 to U2/U3: PB8 = SCL, PB9 = SDA
    let i2c = I2c::new_blocking(
        p.I2C1,
        p.PB8,
        p.PB9,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let mut expanders = Tca9555Bus::new(i2c);
    if expanders
        .configure(I2cAddress::U3, U3_OUTPUT_MASK, U3_IDLE_WORD)
        .and_then(|()| expanders.configure(I2cAddress::U2, U2_OUTPUT_MASK, 0))
        .is_err()
    {
        warn!("expander configuration failed, commands will report bus errors");
    }

    // Bit order matches the direct-pin fields: WTGT, FLAG, DTB1..DTB8
    let pins = McuPins::new(
        [
            Input::new(p.PA0, Pull::Up),
            Input::new(p.PA1, Pull::Up),
            Input::new(p.PA4, Pull::None),
            Input::new(p.PA5, Pull::None),
            Input::new(p.PA6, Pull::None),
            Input::new(p.PA7, Pull::None),
        ],
        Output::new(p.PB0, Level::Low, Speed::Low),
    );

    let mut dispatcher: AdapterDispatcher = Dispatcher::new(
        InstrumentBus::new(expanders, pins),
        Delay,
        DispatcherConfig::default(),
    );
    if let Err(err) = dispatcher.init() {
        warn!("instrument bus init failed: {}", err);
    }

    // USB CDC ACM
    let info = UsbDeviceInfo::default();
    let driver = Driver::new(p.USB, Irqs, p.PA12, p.PA11);
    let mut builder = Builder::new(
        driver,
        info.usb_config(&UsbStrings::default()),
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    );
    let cdc_state = CDC_STATE.init(CdcState::new());
    let mut class = CdcAcmClass::new(&mut builder, cdc_state.state_mut(), USB_CDC_PACKET_SIZE);
    let usb = builder.build();

    unwrap!(spawner.spawn(usb_task(usb)));
    info!("{} ready", info);

    let mut lines = LineBuffer::new();
    loop {
        class.wait_connection().await;
        info!("Host connected");
        lines.clear();
        let outcome = serve(&mut class, &mut dispatcher, &mut lines).await;
        if let Err(EndpointError::BufferOverflow) = outcome {
            warn!("USB buffer overflow");
        }
        info!("Host disconnected");
    }
}

/// Run one host session until the port goes away
///
/// Commands and `poll()` block this executor until they finish. A `*TRG`
/// can hold it for up to `TRIGGER_TIMEOUT_MS`; `usb_task` is not serviced
/// meanwhile and the USB peripheral NAKs the host until the reply is ready.
/// A continuous `poll()` only starts at the first digit of a window, so it
/// normally lasts one transfer.
async fn serve(
    class: &mut CdcAcmClass<'static, UsbDriver>,
    dispatcher: &mut AdapterDispatcher,
    lines: &mut LineBuffer,
) -> Result<(), EndpointError> {
    cdc::write_line(class, BANNER).await?;
    let mut packet = [0u8; USB_CDC_PACKET_SIZE as usize];
    loop {
        let read = select(
            class.read_packet(&mut packet),
            Timer::after(Duration::from_millis(HOST_READ_TIMEOUT_MS)),
        )
        .await;
        match read {
            Either::First(len) => {
                for &byte in &packet[..len?] {
                    if let Some(line) = lines.feed(byte) {
                        let response = dispatcher.execute(&line);
                        cdc::write_response(class, &response).await?;
                    }
                }
            }
            // host idle: forward continuous readings
            Either::Second(()) => {
                let response = dispatcher.poll();
                cdc::write_response(class, &response).await?;
            }
        }
    }
}

/// USB device task
#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}
