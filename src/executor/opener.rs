//! 系统默认程序打开方式

/// 系统默认打开器
pub struct SystemOpener;

impl SystemOpener {
    /// 当前平台的打开命令：macOS `open`，Windows `cmd /c start ""`，其余 `xdg-open`
    pub fn invocation(path: &str) -> (String, Vec<String>) {
        Self::invocation_for(std::env::consts::OS, path)
    }

    pub fn invocation_for(os: &str, path: &str) -> (String, Vec<String>) {
        match os {
            "macos" => ("open".to_string(), vec![path.to_string()]),
            "windows" => (
                "cmd".to_string(),
                vec!["/c".to_string(), "start".to_string(), String::new(), path.to_string()],
            ),
            _ => ("xdg-open".to_string(), vec![path.to_string()]),
        }
    }
}
