// Generic console: COM1 on bare metal, stdout for host builds.

use core::fmt;

pub fn _print(args: fmt::Arguments) {
    #[cfg(feature = "std")]
    {
        std::print!("{args}");
    }
    #[cfg(all(target_arch = "x86_64", not(feature = "std")))]
    {
        use core::fmt::Write;
        let _ = crate::arch::serial::COM1.lock().write_fmt(args);
    }
    #[cfg(not(any(feature = "std", target_arch = "x86_64")))]
    {
        let _ = args;
    }
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::console::_print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}
