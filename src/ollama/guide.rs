/// Print Ollama installation instructions for the current OS
pub fn detect_and_guide(binary: &str) {
    eprintln!("[WARNING] `{}` not found on your system\n", binary);

    #[cfg(target_os = "macos")]
    {
        eprintln!("Install Ollama:");
        eprintln!("[INSTALL] macOS: brew install ollama");
        eprintln!("   or");
        eprintln!("[DOWNLOAD] Download: https://ollama.com/download/mac\n");
    }

    #[cfg(target_os = "linux")]
    {
        eprintln!("Install Ollama:");
        eprintln!("[INSTALL] Linux: curl -fsSL https://ollama.com/install.sh | sh");
        eprintln!("   or");
        eprintln!("[DOWNLOAD] Download: https://ollama.com/download/linux\n");
    }

    #[cfg(target_os = "windows")]
    {
        eprintln!("Install Ollama:");
        eprintln!("[DOWNLOAD] Windows: Download from https://ollama.com/download/windows\n");
    }

    eprintln!("After installing Ollama, run this command again.");
    eprintln!("A different binary can be set with [ollama] binary in the config file.");
}
