//! 宿主适配器。转链插件本身不依赖具体宿主，这里只提供用于本地调试的控制台适配器。

pub mod console;
